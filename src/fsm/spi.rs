//! Collaborators the session state machine drives.
//!
//! The query engine, the transaction store and the authentication provider
//! live outside this crate. The machine talks to them only through these
//! traits, which keeps it testable with scripted implementations.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::bolt::error::{BoltError, BoltResult, Status};
use crate::bolt::message::{AccessMode, AuthToken, Bookmark, QueryStats, QueryType};
use crate::bolt::value::BoltValue;

use super::machine::MachineHandle;

/// Whether a transaction wraps a single RUN or was opened by BEGIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Auto-commit transaction around one RUN
    Implicit,
    /// Transaction bounded by BEGIN and COMMIT/ROLLBACK
    Explicit,
}

/// Parameters for opening a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    /// Implicit or explicit
    pub kind: TransactionKind,
    /// Authenticated principal
    pub principal: String,
    /// Target database
    pub database: String,
    /// Bookmarks the transaction must observe
    pub bookmarks: Vec<String>,
    /// Read or write
    pub mode: AccessMode,
    /// Transaction timeout
    pub timeout: Option<Duration>,
    /// User supplied transaction metadata
    pub metadata: HashMap<String, BoltValue>,
}

/// What the engine reports after accepting a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementMetadata {
    /// Result column names
    pub fields: Vec<String>,
    /// Statement type
    pub query_type: QueryType,
}

/// A batch of records taken from the current result.
///
/// A result that fails partway through still hands back the records
/// produced before the failure, followed by `error`.
#[derive(Debug, Default)]
pub struct RecordBatch {
    /// Records in result order
    pub records: Vec<Vec<BoltValue>>,
    /// More records remain after this batch
    pub has_more: bool,
    /// Failure hit after `records`; the result is finished
    pub error: Option<BoltError>,
}

/// An open database transaction.
///
/// Owned by exactly one session. `run` replaces the current result;
/// `pull`/`discard` consume it.
pub trait TransactionHandle: Send + fmt::Debug {
    /// Identifier, stable for the lifetime of the transaction.
    fn id(&self) -> u64;

    /// Database the transaction runs against.
    fn database(&self) -> &str;

    /// Execute a statement.
    fn run(
        &mut self,
        query: &str,
        parameters: &HashMap<String, BoltValue>,
    ) -> BoltResult<StatementMetadata>;

    /// Take up to `n` records (`-1` for all).
    ///
    /// `Err` means no record could be produced. A failure after some
    /// records goes in [`RecordBatch::error`].
    fn pull(&mut self, n: i64) -> BoltResult<RecordBatch>;

    /// Skip up to `n` records (`-1` for all). Returns whether more remain.
    fn discard(&mut self, n: i64) -> BoltResult<bool>;

    /// Update counters of the last exhausted result.
    fn statistics(&self) -> QueryStats {
        QueryStats::default()
    }

    /// Commit and return the resulting bookmark.
    fn commit(self: Box<Self>) -> BoltResult<Bookmark>;

    /// Roll back.
    fn rollback(self: Box<Self>) -> BoltResult<()>;

    /// Mark the transaction for termination.
    fn interrupt(&self);

    /// Why the transaction was terminated server-side, if it was.
    fn termination_reason(&self) -> Option<Status>;
}

/// Opens transactions.
pub trait TransactionManager: Send + Sync {
    /// Begin a transaction.
    fn begin(&self, request: TransactionRequest) -> BoltResult<Box<dyn TransactionHandle>>;
}

/// Result of checking credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthVerdict {
    /// Credentials accepted
    Authenticated(String),
    /// Credentials accepted but must be changed before normal use
    CredentialsExpired(String),
    /// Credentials rejected, with the reason
    Unauthorized(String),
}

/// Checks credentials. Shared by every connection.
pub trait AuthenticationVerifier: Send + Sync {
    /// Verify an auth token.
    ///
    /// `Err` means the provider itself failed; bad credentials are
    /// [`AuthVerdict::Unauthorized`].
    fn verify(&self, token: &AuthToken) -> BoltResult<AuthVerdict>;
}

/// Notified about session lifecycle events.
pub trait SessionObserver: Send + Sync {
    /// A principal authenticated on a connection.
    fn on_authenticated(&self, principal: &str, handle: MachineHandle);

    /// The principal logged off; the connection stays open.
    fn on_logged_off(&self, _connection_id: &str) {}

    /// The connection closed.
    fn on_closed(&self, connection_id: &str);
}
