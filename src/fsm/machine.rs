//! The Bolt session state machine.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::bolt::error::{BoltError, BoltResult};
use crate::bolt::message::{BoltRequest, FailureMessage, MessageKind};
use crate::bolt::version::BoltVersion;
use crate::config::SessionConfig;

use super::context::{ConnectionContext, ConnectionSignals, Principal};
use super::response::{ResponseHandler, Terminal};
use super::spi::{AuthenticationVerifier, SessionObserver, TransactionHandle, TransactionManager};
use super::state::{legality, Legality, State};
use super::states::{self, Outcome};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

fn next_connection_id() -> String {
    format!("bolt-{}", NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
}

// ============================================================================
// MachineHandle
// ============================================================================

/// Thread-safe control surface of a machine.
///
/// Used by administrative and timeout threads; effects are observed by the
/// machine at its next `process` call.
#[derive(Clone)]
pub struct MachineHandle {
    connection_id: Arc<str>,
    signals: Arc<ConnectionSignals>,
}

impl MachineHandle {
    pub(crate) fn new(connection_id: String, signals: Arc<ConnectionSignals>) -> Self {
        Self {
            connection_id: connection_id.into(),
            signals,
        }
    }

    /// Connection id.
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Request an interrupt; one RESET acknowledges it.
    pub fn interrupt(&self) {
        let pending = self.signals.interrupt();
        debug!("{}: interrupt requested ({} pending)", self.connection_id, pending);
    }

    /// Request termination of the connection.
    pub fn terminate(&self) {
        debug!("{}: termination requested", self.connection_id);
        self.signals.terminate();
    }

    /// Check if termination was requested.
    pub fn is_terminated(&self) -> bool {
        self.signals.is_terminated()
    }

    /// Number of interrupts not yet acknowledged.
    pub fn pending_interrupts(&self) -> usize {
        self.signals.pending_interrupts()
    }

    /// Deliver `error` as the FAILURE of the next processed request.
    pub fn mark_failed(&self, error: &BoltError) {
        self.signals.mark_failed(error.to_failure());
    }

    pub(crate) fn signals(&self) -> &ConnectionSignals {
        &self.signals
    }
}

impl fmt::Debug for MachineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineHandle")
            .field("connection_id", &self.connection_id)
            .field("signals", &self.signals)
            .finish()
    }
}

// ============================================================================
// BoltStateMachine
// ============================================================================

/// State machine of one Bolt connection.
///
/// `process` is called by one thread at a time. [`MachineHandle`] is the
/// part that may be used concurrently.
pub struct BoltStateMachine {
    state: State,
    ctx: ConnectionContext,
    closed: bool,
}

impl BoltStateMachine {
    /// Create a machine for a connection that negotiated `version`.
    pub fn new(
        version: BoltVersion,
        config: Arc<SessionConfig>,
        transactions: Arc<dyn TransactionManager>,
        authentication: Arc<dyn AuthenticationVerifier>,
    ) -> Self {
        let ctx = ConnectionContext::new(
            next_connection_id(),
            version,
            config,
            transactions,
            authentication,
        );
        Self {
            state: State::initial(version),
            ctx,
            closed: false,
        }
    }

    /// Report lifecycle events to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.ctx.observer = Some(observer);
        self
    }

    /// Connection id.
    pub fn connection_id(&self) -> &str {
        &self.ctx.connection_id
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Negotiated protocol version.
    pub fn version(&self) -> BoltVersion {
        self.ctx.version
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.ctx.config
    }

    /// Connection context.
    pub fn context(&self) -> &ConnectionContext {
        &self.ctx
    }

    /// Authenticated principal.
    pub fn principal(&self) -> Option<&Principal> {
        self.ctx.principal()
    }

    /// Associated transaction.
    pub fn transaction(&self) -> Option<&dyn TransactionHandle> {
        self.ctx.transaction()
    }

    /// Check if the connection is closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Thread-safe control handle.
    pub fn handle(&self) -> MachineHandle {
        self.ctx.handle()
    }

    /// Request an interrupt.
    pub fn interrupt(&self) {
        self.handle().interrupt();
    }

    /// Request termination.
    pub fn terminate(&self) {
        self.handle().terminate();
    }

    /// Deliver `error` as the FAILURE of the next processed request.
    pub fn mark_failed(&self, error: &BoltError) {
        self.handle().mark_failed(error);
    }

    /// Close the machine if termination was requested. Returns whether the
    /// machine is closed.
    pub fn validate_termination(&mut self) -> bool {
        if !self.closed && self.ctx.signals.is_terminated() {
            debug!("{}: closing terminated connection", self.ctx.connection_id);
            self.close();
        }
        self.closed
    }

    /// Process one request.
    ///
    /// Emits zero or more records and exactly one terminal response to
    /// `handler` (none for GOODBYE or on a closed machine). Protocol errors
    /// become FAILURE responses; `Err` is an I/O fault from `handler` or
    /// [`BoltError::ConnectionClosed`].
    pub fn process(
        &mut self,
        request: BoltRequest,
        handler: &mut dyn ResponseHandler,
    ) -> BoltResult<()> {
        if self.validate_termination() {
            return Err(BoltError::ConnectionClosed);
        }

        if self.ctx.signals.interrupted() && self.state != State::Interrupted {
            if self.state.is_pre_authentication() {
                let failure = FailureMessage::invalid_request(&format!(
                    "Interrupted before authentication in the {} state.",
                    self.state
                ));
                return self.kill(failure, handler);
            }
            self.enter_interrupted();
        }

        let kind = request.kind();
        let verdict = legality(self.state, kind, self.ctx.version);
        match verdict {
            Legality::Reject => {
                let error = BoltError::InvalidRequest {
                    request: kind.name(),
                    state: self.state.name(),
                };
                return self.kill(error.to_failure(), handler);
            }
            Legality::Handle if kind == MessageKind::Goodbye => {
                return self.apply(kind.name(), Outcome::Close, handler);
            }
            _ => {}
        }

        // A pending failure answers handled requests, and ignored ones only in FAILED.
        if verdict == Legality::Handle || self.state == State::Failed {
            if let Some(failure) = self.take_pending_failure() {
                return self.fail_pending(kind.name(), failure, handler);
            }
        }

        if verdict == Legality::Ignore {
            debug!(
                "{}: {} ignored in {}",
                self.ctx.connection_id, kind, self.state
            );
            return handler.on_ignored();
        }
        let outcome = states::dispatch(self.state, request, &mut self.ctx, handler)?;
        self.apply(kind.name(), outcome, handler)
    }

    /// A pending failure is held back while INTERRUPTED; the draining RESET
    /// discards it.
    fn take_pending_failure(&self) -> Option<FailureMessage> {
        if self.state == State::Interrupted {
            return None;
        }
        self.ctx.signals.take_pending_failure()
    }

    fn fail_pending(
        &mut self,
        request: &'static str,
        failure: FailureMessage,
        handler: &mut dyn ResponseHandler,
    ) -> BoltResult<()> {
        if self.state.is_pre_authentication() {
            return self.kill(failure, handler);
        }
        if self.state == State::AutoCommit {
            // Rollback failures are logged by the context.
            let _ = self.ctx.rollback_transaction();
        }
        let outcome = Outcome::next(State::Failed, Terminal::Failure(failure));
        self.apply(request, outcome, handler)
    }

    /// Close the connection: roll back any transaction and notify the
    /// observer. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // Rollback failures are logged by the context.
        let _ = self.ctx.rollback_transaction();
        if let Some(observer) = &self.ctx.observer {
            observer.on_closed(&self.ctx.connection_id);
        }
        debug!("{}: closed in {}", self.ctx.connection_id, self.state);
    }

    fn enter_interrupted(&mut self) {
        debug!(
            "{}: {} -> {} (interrupt pending)",
            self.ctx.connection_id,
            self.state,
            State::Interrupted
        );
        self.state = State::Interrupted;
        if let Some(tx) = self.ctx.transaction.as_deref() {
            tx.interrupt();
        }
    }

    fn apply(
        &mut self,
        request: &'static str,
        outcome: Outcome,
        handler: &mut dyn ResponseHandler,
    ) -> BoltResult<()> {
        match outcome {
            Outcome::Next { state, response } => {
                if state != self.state {
                    debug!(
                        "{}: {} -> {} on {} ({})",
                        self.ctx.connection_id,
                        self.state,
                        state,
                        request,
                        response.name()
                    );
                }
                self.state = state;
                response.emit(handler)
            }
            Outcome::Fatal(failure) => self.kill(failure, handler),
            Outcome::Close => {
                debug!("{}: {} received", self.ctx.connection_id, request);
                self.close();
                Ok(())
            }
        }
    }

    /// FAILURE, then close. The state label is left as it was.
    fn kill(&mut self, failure: FailureMessage, handler: &mut dyn ResponseHandler) -> BoltResult<()> {
        warn!(
            "{}: killing connection in {}: {}",
            self.ctx.connection_id, self.state, failure
        );
        let result = handler.on_failure(failure);
        self.close();
        result
    }
}

impl fmt::Debug for BoltStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoltStateMachine")
            .field("state", &self.state)
            .field("closed", &self.closed)
            .field("ctx", &self.ctx)
            .finish()
    }
}

impl Drop for BoltStateMachine {
    fn drop(&mut self) {
        self.close();
    }
}
