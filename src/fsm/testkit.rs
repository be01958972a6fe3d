//! Scripted collaborators for state machine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::bolt::error::{BoltError, BoltResult, Status};
use crate::bolt::message::{
    AuthToken, BeginMessage, BoltRequest, Bookmark, DiscardMessage, HelloMessage, LogonMessage,
    PullMessage, QueryStats, QueryType, RunMessage,
};
use crate::bolt::value::BoltValue;
use crate::bolt::version::BoltVersion;
use crate::config::SessionConfig;

use super::machine::BoltStateMachine;
use super::response::{BoltResponseRecorder, RecordedResponse};
use super::spi::{
    AuthVerdict, AuthenticationVerifier, RecordBatch, SessionObserver, StatementMetadata,
    TransactionHandle, TransactionKind, TransactionManager, TransactionRequest,
};

pub(crate) const RETURN_ONE: &str = "RETURN 1";
pub(crate) const UNWIND_THREE: &str = "UNWIND [1, 2, 3] AS x RETURN x";
pub(crate) const CREATE_NODE: &str = "CREATE (n:Node)";
pub(crate) const DIVIDE_BY_ZERO: &str = "UNWIND [1, 0] AS x RETURN 1 / x";
pub(crate) const CHANGE_PASSWORD: &str = "ALTER CURRENT USER SET PASSWORD FROM 'old' TO 'new'";
pub(crate) const BAD_SYNTAX: &str = "bad syntax";

// ============================================================================
// Transactions
// ============================================================================

/// Canned result of one query.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedResult {
    pub(crate) fields: Vec<String>,
    pub(crate) records: Vec<Vec<BoltValue>>,
    pub(crate) query_type: QueryType,
    pub(crate) stats: QueryStats,
    /// Fails the first PULL/DISCARD after this many records
    pub(crate) fail_after: Option<(usize, Status)>,
}

impl ScriptedResult {
    pub(crate) fn rows(field: &str, values: &[i64]) -> Self {
        Self {
            fields: vec![field.to_string()],
            records: values.iter().map(|v| vec![BoltValue::Integer(*v)]).collect(),
            query_type: QueryType::ReadOnly,
            stats: QueryStats::default(),
            fail_after: None,
        }
    }
}

type Script = Result<ScriptedResult, (Status, String)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TxEvent {
    Begun(u64, TransactionKind),
    Ran(u64, String),
    Committed(u64),
    RolledBack(u64),
    Interrupted(u64),
}

#[derive(Debug, Default)]
struct Shared {
    events: Mutex<Vec<TxEvent>>,
    terminations: Mutex<HashMap<u64, Status>>,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
    last_bookmark: AtomicU64,
}

impl Shared {
    fn record(&self, event: TxEvent) {
        self.events.lock().push(event);
    }
}

/// Holds the next `begin` until released.
pub(crate) struct BeginGate {
    /// Resolves once `begin` is blocked
    pub(crate) entered: oneshot::Receiver<()>,
    /// Lets `begin` continue
    pub(crate) release: mpsc::Sender<()>,
}

/// Transaction manager answering from scripts keyed by query text.
pub(crate) struct InMemoryTransactions {
    shared: Arc<Shared>,
    scripts: Mutex<HashMap<String, Script>>,
    requests: Mutex<Vec<TransactionRequest>>,
    next_id: AtomicU64,
    fail_begin: AtomicBool,
    gate: Mutex<Option<(oneshot::Sender<()>, mpsc::Receiver<()>)>>,
}

impl InMemoryTransactions {
    pub(crate) fn new() -> Self {
        let mut scripts: HashMap<String, Script> = HashMap::new();
        scripts.insert(RETURN_ONE.to_string(), Ok(ScriptedResult::rows("1", &[1])));
        scripts.insert(UNWIND_THREE.to_string(), Ok(ScriptedResult::rows("x", &[1, 2, 3])));
        scripts.insert(
            CREATE_NODE.to_string(),
            Ok(ScriptedResult {
                fields: Vec::new(),
                records: Vec::new(),
                query_type: QueryType::WriteOnly,
                stats: QueryStats {
                    nodes_created: 1,
                    labels_added: 1,
                    ..Default::default()
                },
                fail_after: None,
            }),
        );
        scripts.insert(
            DIVIDE_BY_ZERO.to_string(),
            Ok(ScriptedResult {
                fail_after: Some((1, Status::StatementExecutionFailed)),
                ..ScriptedResult::rows("1 / x", &[1, 0])
            }),
        );
        scripts.insert(
            CHANGE_PASSWORD.to_string(),
            Ok(ScriptedResult {
                query_type: QueryType::WriteOnly,
                ..ScriptedResult::rows("ok", &[])
            }),
        );

        Self {
            shared: Arc::new(Shared::default()),
            scripts: Mutex::new(scripts),
            requests: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            fail_begin: AtomicBool::new(false),
            gate: Mutex::new(None),
        }
    }

    /// Block the next `begin` until the returned gate is released.
    pub(crate) fn hold_next_begin(&self) -> BeginGate {
        let (entered_tx, entered) = oneshot::channel();
        let (release, release_rx) = mpsc::channel();
        *self.gate.lock() = Some((entered_tx, release_rx));
        BeginGate { entered, release }
    }

    pub(crate) fn events(&self) -> Vec<TxEvent> {
        self.shared.events.lock().clone()
    }

    pub(crate) fn requests(&self) -> Vec<TransactionRequest> {
        self.requests.lock().clone()
    }

    /// Terminate a live transaction server-side.
    pub(crate) fn terminate(&self, id: u64, reason: Status) {
        self.shared.terminations.lock().insert(id, reason);
    }

    pub(crate) fn fail_begin(&self, fail: bool) {
        self.fail_begin.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_commit(&self, fail: bool) {
        self.shared.fail_commit.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_rollback(&self, fail: bool) {
        self.shared.fail_rollback.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn committed(&self) -> usize {
        self.count(|e| matches!(e, TxEvent::Committed(_)))
    }

    pub(crate) fn rolled_back(&self) -> usize {
        self.count(|e| matches!(e, TxEvent::RolledBack(_)))
    }

    pub(crate) fn interrupted(&self) -> usize {
        self.count(|e| matches!(e, TxEvent::Interrupted(_)))
    }

    fn count(&self, predicate: impl Fn(&TxEvent) -> bool) -> usize {
        self.shared.events.lock().iter().filter(|e| predicate(e)).count()
    }
}

impl TransactionManager for InMemoryTransactions {
    fn begin(&self, request: TransactionRequest) -> BoltResult<Box<dyn TransactionHandle>> {
        let gate = self.gate.lock().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.recv();
        }
        if self.fail_begin.load(Ordering::SeqCst) {
            return Err(BoltError::status(
                Status::TransactionStartFailed,
                "Unable to start transaction",
            ));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.shared.record(TxEvent::Begun(id, request.kind));
        let tx = InMemoryTransaction {
            id,
            database: request.database.clone(),
            shared: Arc::clone(&self.shared),
            scripts: self.scripts.lock().clone(),
            cursor: None,
            last_stats: QueryStats::default(),
        };
        self.requests.lock().push(request);
        Ok(Box::new(tx))
    }
}

#[derive(Debug)]
struct Cursor {
    records: VecDeque<Vec<BoltValue>>,
    consumed: usize,
    stats: QueryStats,
    fail_after: Option<(usize, Status)>,
}

#[derive(Debug)]
pub(crate) struct InMemoryTransaction {
    id: u64,
    database: String,
    shared: Arc<Shared>,
    scripts: HashMap<String, Script>,
    cursor: Option<Cursor>,
    last_stats: QueryStats,
}

impl InMemoryTransaction {
    fn advance(&mut self, n: i64) -> BoltResult<RecordBatch> {
        let cursor = self.cursor.as_mut().ok_or_else(|| {
            BoltError::status(Status::RequestInvalid, "No open result")
        })?;
        let wanted = if n < 0 { usize::MAX } else { n as usize };

        let mut batch = RecordBatch::default();
        while batch.records.len() < wanted {
            if let Some((limit, status)) = cursor.fail_after {
                if cursor.consumed == limit {
                    batch.error = Some(BoltError::status(status, "/ by zero"));
                    break;
                }
            }
            match cursor.records.pop_front() {
                Some(record) => {
                    cursor.consumed += 1;
                    batch.records.push(record);
                }
                None => break,
            }
        }

        if batch.error.is_some() {
            self.cursor = None;
        } else {
            batch.has_more = !cursor.records.is_empty();
            if !batch.has_more {
                self.last_stats = cursor.stats.clone();
                self.cursor = None;
            }
        }
        Ok(batch)
    }
}

impl TransactionHandle for InMemoryTransaction {
    fn id(&self) -> u64 {
        self.id
    }

    fn database(&self) -> &str {
        &self.database
    }

    fn run(
        &mut self,
        query: &str,
        _parameters: &HashMap<String, BoltValue>,
    ) -> BoltResult<StatementMetadata> {
        self.shared.record(TxEvent::Ran(self.id, query.to_string()));
        let script = self.scripts.get(query).cloned().unwrap_or_else(|| {
            Err((
                Status::StatementSyntaxError,
                format!("Invalid input '{}'", query),
            ))
        });

        match script {
            Ok(result) => {
                self.cursor = Some(Cursor {
                    records: result.records.into(),
                    consumed: 0,
                    stats: result.stats,
                    fail_after: result.fail_after,
                });
                Ok(StatementMetadata {
                    fields: result.fields,
                    query_type: result.query_type,
                })
            }
            Err((status, message)) => Err(BoltError::status(status, message)),
        }
    }

    fn pull(&mut self, n: i64) -> BoltResult<RecordBatch> {
        self.advance(n)
    }

    fn discard(&mut self, n: i64) -> BoltResult<bool> {
        let batch = self.advance(n)?;
        match batch.error {
            Some(e) => Err(e),
            None => Ok(batch.has_more),
        }
    }

    fn statistics(&self) -> QueryStats {
        self.last_stats.clone()
    }

    fn commit(self: Box<Self>) -> BoltResult<Bookmark> {
        if self.shared.fail_commit.load(Ordering::SeqCst) {
            return Err(BoltError::status(
                Status::TransactionCommitFailed,
                "Commit failed",
            ));
        }
        self.shared.record(TxEvent::Committed(self.id));
        let n = self.shared.last_bookmark.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Bookmark::new(format!("zeta4g:tx:{}", n)))
    }

    fn rollback(self: Box<Self>) -> BoltResult<()> {
        if self.shared.fail_rollback.load(Ordering::SeqCst) {
            return Err(BoltError::status(
                Status::TransactionRollbackFailed,
                "Rollback failed",
            ));
        }
        self.shared.record(TxEvent::RolledBack(self.id));
        Ok(())
    }

    fn interrupt(&self) {
        self.shared.record(TxEvent::Interrupted(self.id));
    }

    fn termination_reason(&self) -> Option<Status> {
        self.shared.terminations.lock().get(&self.id).copied()
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Verifier backed by a fixed user table.
///
/// `neo4j`/`password` is valid, `expired`/`password` has expired credentials.
pub(crate) struct StaticVerifier {
    users: HashMap<String, (String, bool)>,
    provider_down: AtomicBool,
}

impl Default for StaticVerifier {
    fn default() -> Self {
        let mut users = HashMap::new();
        users.insert("neo4j".to_string(), ("password".to_string(), false));
        users.insert("expired".to_string(), ("password".to_string(), true));
        Self {
            users,
            provider_down: AtomicBool::new(false),
        }
    }
}

impl StaticVerifier {
    pub(crate) fn provider_down(&self, down: bool) {
        self.provider_down.store(down, Ordering::SeqCst);
    }
}

impl AuthenticationVerifier for StaticVerifier {
    fn verify(&self, token: &AuthToken) -> BoltResult<AuthVerdict> {
        if self.provider_down.load(Ordering::SeqCst) {
            return Err(BoltError::status(
                Status::SecurityAuthProviderFailed,
                "Authentication provider unavailable",
            ));
        }
        if token.scheme != "basic" {
            return Ok(AuthVerdict::Unauthorized(format!(
                "Unsupported authentication scheme '{}'",
                token.scheme
            )));
        }

        let principal = token.principal.clone().unwrap_or_default();
        let credentials = token.credentials.clone().unwrap_or_default();
        match self.users.get(&principal) {
            Some((password, expired)) if *password == credentials => Ok(if *expired {
                AuthVerdict::CredentialsExpired(principal)
            } else {
                AuthVerdict::Authenticated(principal)
            }),
            _ => Ok(AuthVerdict::Unauthorized(
                "The client is unauthorized due to authentication failure.".to_string(),
            )),
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

pub(crate) fn hello() -> BoltRequest {
    BoltRequest::Hello(HelloMessage::new("zeta4g-tests/1.0"))
}

pub(crate) fn hello_with_auth(user: &str, password: &str) -> BoltRequest {
    BoltRequest::Hello(
        HelloMessage::new("zeta4g-tests/1.0").with_auth(AuthToken::basic(user, password)),
    )
}

pub(crate) fn logon(user: &str, password: &str) -> BoltRequest {
    BoltRequest::Logon(LogonMessage::new(AuthToken::basic(user, password)))
}

pub(crate) fn run(query: &str) -> BoltRequest {
    BoltRequest::Run(RunMessage::new(query))
}

pub(crate) fn pull(n: i64) -> BoltRequest {
    BoltRequest::Pull(PullMessage::with_n(n))
}

pub(crate) fn discard(n: i64) -> BoltRequest {
    BoltRequest::Discard(DiscardMessage::with_n(n))
}

pub(crate) fn begin() -> BoltRequest {
    BoltRequest::Begin(BeginMessage::new())
}

/// One request of every kind.
pub(crate) fn one_of_each() -> Vec<BoltRequest> {
    vec![
        hello(),
        logon("neo4j", "password"),
        BoltRequest::Logoff,
        run(RETURN_ONE),
        begin(),
        pull(1),
        discard(1),
        BoltRequest::Commit,
        BoltRequest::Rollback,
        BoltRequest::Reset,
        BoltRequest::Goodbye,
    ]
}

/// A machine wired to scripted collaborators, with a response recorder.
pub(crate) struct Harness {
    pub(crate) machine: BoltStateMachine,
    pub(crate) transactions: Arc<InMemoryTransactions>,
    pub(crate) verifier: Arc<StaticVerifier>,
    pub(crate) recorder: BoltResponseRecorder,
}

impl Harness {
    pub(crate) fn new(version: BoltVersion) -> Self {
        Self::with_config(version, SessionConfig::default())
    }

    pub(crate) fn with_config(version: BoltVersion, config: SessionConfig) -> Self {
        let transactions = Arc::new(InMemoryTransactions::new());
        let verifier = Arc::new(StaticVerifier::default());
        let machine = BoltStateMachine::new(
            version,
            Arc::new(config),
            Arc::clone(&transactions) as Arc<dyn TransactionManager>,
            Arc::clone(&verifier) as Arc<dyn AuthenticationVerifier>,
        );
        Self {
            machine,
            transactions,
            verifier,
            recorder: BoltResponseRecorder::new(),
        }
    }

    pub(crate) fn observed(self, observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            machine: self.machine.with_observer(observer),
            ..self
        }
    }

    /// A Bolt 5.4 machine already in READY.
    pub(crate) fn ready() -> Self {
        let mut harness = Self::new(BoltVersion::V5_4);
        harness.authenticate("neo4j", "password");
        harness
    }

    pub(crate) fn authenticate(&mut self, user: &str, password: &str) {
        if self.machine.version().supports_logon() {
            assert!(self.send(hello()).success().is_some());
            assert!(self.send(logon(user, password)).success().is_some());
        } else {
            assert!(self.send(hello_with_auth(user, password)).success().is_some());
        }
    }

    /// Process a request that must produce a response.
    pub(crate) fn send(&mut self, request: BoltRequest) -> RecordedResponse {
        let name = request.name();
        self.machine
            .process(request, &mut self.recorder)
            .unwrap_or_else(|e| panic!("{} failed: {}", name, e));
        self.recorder
            .next_response()
            .unwrap_or_else(|| panic!("{} produced no response", name))
    }

    /// Process a request, returning the raw result.
    pub(crate) fn try_send(&mut self, request: BoltRequest) -> BoltResult<Option<RecordedResponse>> {
        self.machine.process(request, &mut self.recorder)?;
        Ok(self.recorder.next_response())
    }

    pub(crate) fn transaction_id(&self) -> Option<u64> {
        self.machine.transaction().map(|tx| tx.id())
    }
}
