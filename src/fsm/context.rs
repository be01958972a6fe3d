//! Per-connection session context.
//!
//! [`ConnectionSignals`] is the only part touched by other threads; the rest
//! of [`ConnectionContext`] belongs to whoever is running `process`.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::warn;

use crate::bolt::error::BoltResult;
use crate::bolt::message::{FailureMessage, QueryType};
use crate::bolt::version::BoltVersion;
use crate::config::SessionConfig;

use super::machine::MachineHandle;
use super::spi::{AuthenticationVerifier, SessionObserver, TransactionHandle, TransactionManager};

type Waker = Box<dyn Fn() + Send + Sync>;

/// Authenticated user of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
    credentials_expired: bool,
}

impl Principal {
    /// Create a principal.
    pub fn new(name: impl Into<String>, credentials_expired: bool) -> Self {
        Self {
            name: name.into(),
            credentials_expired,
        }
    }

    /// User name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the credentials must be changed.
    pub fn credentials_expired(&self) -> bool {
        self.credentials_expired
    }
}

/// Signals raised from outside the processing thread.
///
/// Their effect is observed at the next `process` call, never in the
/// middle of one.
#[derive(Default)]
pub struct ConnectionSignals {
    interrupt_counter: AtomicUsize,
    terminated: AtomicBool,
    pending_failure: Mutex<Option<FailureMessage>>,
    waker: Mutex<Option<Waker>>,
}

impl ConnectionSignals {
    /// Create cleared signals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request one interrupt. Returns the number now pending.
    pub fn interrupt(&self) -> usize {
        self.interrupt_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Check if any interrupt is pending.
    pub fn interrupted(&self) -> bool {
        self.pending_interrupts() > 0
    }

    /// Number of interrupts not yet acknowledged by a RESET.
    pub fn pending_interrupts(&self) -> usize {
        self.interrupt_counter.load(Ordering::SeqCst)
    }

    /// Acknowledge one interrupt. Returns the number still pending.
    pub fn acknowledge_interrupt(&self) -> usize {
        match self
            .interrupt_counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(previous) => previous - 1,
            Err(_) => 0,
        }
    }

    /// Request termination and wake the worker, once.
    pub fn terminate(&self) {
        if !self.terminated.swap(true, Ordering::SeqCst) {
            if let Some(wake) = self.waker.lock().as_ref() {
                wake();
            }
        }
    }

    /// Check if termination was requested.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Install the callback run when termination is requested.
    ///
    /// Runs immediately if termination was already requested.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        let mut slot = self.waker.lock();
        if self.is_terminated() {
            waker();
        }
        *slot = Some(Box::new(waker));
    }

    /// Queue a failure for the next processed request. The first one wins.
    pub fn mark_failed(&self, failure: FailureMessage) {
        let mut slot = self.pending_failure.lock();
        if slot.is_none() {
            *slot = Some(failure);
        }
    }

    /// Take the queued failure.
    pub fn take_pending_failure(&self) -> Option<FailureMessage> {
        self.pending_failure.lock().take()
    }

    /// Check if a failure is queued.
    pub fn has_pending_failure(&self) -> bool {
        self.pending_failure.lock().is_some()
    }
}

impl fmt::Debug for ConnectionSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSignals")
            .field("interrupts", &self.pending_interrupts())
            .field("terminated", &self.is_terminated())
            .field("pending_failure", &self.has_pending_failure())
            .finish()
    }
}

/// Result currently open for streaming.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActiveStatement {
    pub(crate) query_type: QueryType,
    pub(crate) available_at: Instant,
    /// Statement id, only issued inside explicit transactions
    pub(crate) qid: Option<i64>,
}

impl ActiveStatement {
    /// Whether a PULL/DISCARD with `qid` targets this statement. `-1` and
    /// an absent qid mean the latest one.
    pub(crate) fn answers(&self, qid: Option<i64>) -> bool {
        match qid {
            None | Some(-1) => true,
            requested => requested == self.qid,
        }
    }
}

/// Per-connection state owned by the processing thread.
pub struct ConnectionContext {
    pub(crate) connection_id: String,
    pub(crate) version: BoltVersion,
    pub(crate) config: Arc<SessionConfig>,
    pub(crate) signals: Arc<ConnectionSignals>,
    pub(crate) transactions: Arc<dyn TransactionManager>,
    pub(crate) authentication: Arc<dyn AuthenticationVerifier>,
    pub(crate) observer: Option<Arc<dyn SessionObserver>>,
    pub(crate) principal: Option<Principal>,
    pub(crate) transaction: Option<Box<dyn TransactionHandle>>,
    pub(crate) statement: Option<ActiveStatement>,
    pub(crate) next_qid: i64,
    pub(crate) user_agent: Option<String>,
    pub(crate) utc_patch: bool,
}

impl ConnectionContext {
    pub(crate) fn new(
        connection_id: String,
        version: BoltVersion,
        config: Arc<SessionConfig>,
        transactions: Arc<dyn TransactionManager>,
        authentication: Arc<dyn AuthenticationVerifier>,
    ) -> Self {
        Self {
            connection_id,
            version,
            config,
            signals: Arc::new(ConnectionSignals::new()),
            transactions,
            authentication,
            observer: None,
            principal: None,
            transaction: None,
            statement: None,
            next_qid: 0,
            user_agent: None,
            utc_patch: false,
        }
    }

    /// Connection id.
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Negotiated protocol version.
    pub fn version(&self) -> BoltVersion {
        self.version
    }

    /// Authenticated principal.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// User agent sent in HELLO.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Check if the `utc` patch was negotiated.
    pub fn utc_patch(&self) -> bool {
        self.utc_patch
    }

    /// Associated transaction.
    pub fn transaction(&self) -> Option<&dyn TransactionHandle> {
        self.transaction.as_deref()
    }

    pub(crate) fn handle(&self) -> MachineHandle {
        MachineHandle::new(self.connection_id.clone(), Arc::clone(&self.signals))
    }

    pub(crate) fn login(&mut self, principal: Principal) {
        if let Some(observer) = &self.observer {
            observer.on_authenticated(principal.name(), self.handle());
        }
        self.principal = Some(principal);
    }

    pub(crate) fn logoff(&mut self) {
        self.principal = None;
        if let Some(observer) = &self.observer {
            observer.on_logged_off(&self.connection_id);
        }
    }

    pub(crate) fn principal_name(&self) -> String {
        self.principal
            .as_ref()
            .map(|p| p.name().to_string())
            .unwrap_or_default()
    }

    pub(crate) fn credentials_expired(&self) -> bool {
        self.principal
            .as_ref()
            .map(Principal::credentials_expired)
            .unwrap_or(false)
    }

    pub(crate) fn database_or_default(&self, requested: Option<&str>) -> String {
        requested
            .filter(|db| !db.is_empty())
            .unwrap_or(self.config.default_database.as_str())
            .to_string()
    }

    pub(crate) fn open_statement(&mut self, query_type: QueryType, qid: Option<i64>) {
        self.statement = Some(ActiveStatement {
            query_type,
            available_at: Instant::now(),
            qid,
        });
    }

    /// Roll back and forget the associated transaction, if any.
    pub(crate) fn rollback_transaction(&mut self) -> BoltResult<()> {
        self.statement = None;
        match self.transaction.take() {
            Some(tx) => {
                let id = tx.id();
                tx.rollback().map_err(|e| {
                    warn!("{}: rollback of transaction {} failed: {}", self.connection_id, id, e);
                    e
                })
            }
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("connection_id", &self.connection_id)
            .field("version", &self.version)
            .field("principal", &self.principal)
            .field("transaction", &self.transaction)
            .field("signals", &self.signals)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::error::Status;

    #[test]
    fn test_interrupt_counter() {
        let signals = ConnectionSignals::new();
        assert!(!signals.interrupted());
        assert_eq!(signals.interrupt(), 1);
        assert_eq!(signals.interrupt(), 2);
        assert!(signals.interrupted());
        assert_eq!(signals.acknowledge_interrupt(), 1);
        assert_eq!(signals.acknowledge_interrupt(), 0);
        assert_eq!(signals.acknowledge_interrupt(), 0);
        assert!(!signals.interrupted());
    }

    #[test]
    fn test_terminate_wakes_once() {
        let signals = ConnectionSignals::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        signals.set_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        signals.terminate();
        signals.terminate();
        assert!(signals.is_terminated());
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_waker_installed_after_terminate() {
        let signals = ConnectionSignals::new();
        signals.terminate();

        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        signals.set_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pending_failure_first_wins() {
        let signals = ConnectionSignals::new();
        signals.mark_failed(FailureMessage::new(Status::RequestNoThreadsAvailable, "busy"));
        signals.mark_failed(FailureMessage::new(Status::GeneralUnknownError, "later"));
        assert!(signals.has_pending_failure());

        let failure = signals.take_pending_failure().unwrap();
        assert_eq!(failure.status, Status::RequestNoThreadsAvailable);
        assert!(signals.take_pending_failure().is_none());
    }

    #[test]
    fn test_interrupts_from_many_threads() {
        let signals = Arc::new(ConnectionSignals::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let signals = Arc::clone(&signals);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        signals.interrupt();
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
        assert_eq!(signals.pending_interrupts(), 800);
    }

    #[test]
    fn test_principal() {
        let principal = Principal::new("neo", true);
        assert_eq!(principal.name(), "neo");
        assert!(principal.credentials_expired());
    }
}
