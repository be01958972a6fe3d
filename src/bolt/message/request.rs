//! Bolt protocol request messages.
//!
//! Request messages are sent from the client to the server.

use std::collections::HashMap;
use std::time::Duration;

use super::{tag, MessageKind};
use crate::bolt::value::BoltValue;

/// Access mode for transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Read-write access (default)
    #[default]
    Write,
    /// Read-only access
    Read,
}

impl AccessMode {
    /// Convert from string.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "r" | "read" => AccessMode::Read,
            _ => AccessMode::Write,
        }
    }

    /// Convert to string for metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Read => "r",
            AccessMode::Write => "w",
        }
    }
}

/// Authentication token carried by HELLO (Bolt < 5.1) or LOGON.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    /// Authentication scheme (e.g., "basic", "bearer")
    pub scheme: String,
    /// Principal (username)
    pub principal: Option<String>,
    /// Credentials (password)
    pub credentials: Option<String>,
    /// Realm
    pub realm: Option<String>,
    /// Additional parameters
    pub parameters: HashMap<String, BoltValue>,
}

impl AuthToken {
    /// Create a basic auth token.
    pub fn basic(principal: &str, credentials: &str) -> Self {
        Self {
            scheme: "basic".to_string(),
            principal: Some(principal.to_string()),
            credentials: Some(credentials.to_string()),
            realm: None,
            parameters: HashMap::new(),
        }
    }

    /// Create an anonymous auth token (no auth).
    pub fn none() -> Self {
        Self {
            scheme: "none".to_string(),
            principal: None,
            credentials: None,
            realm: None,
            parameters: HashMap::new(),
        }
    }

    /// Parse from a decoded auth map.
    ///
    /// A missing scheme is treated as `none`.
    pub fn from_map(map: &HashMap<String, BoltValue>) -> Self {
        let field = |key: &str| map.get(key).and_then(|v| v.as_str()).map(str::to_string);

        let parameters = map
            .iter()
            .filter(|(k, _)| !["scheme", "principal", "credentials", "realm"].contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            scheme: field("scheme").unwrap_or_else(|| "none".to_string()),
            principal: field("principal"),
            credentials: field("credentials"),
            realm: field("realm"),
            parameters,
        }
    }
}

/// All Bolt request messages the session understands.
#[derive(Debug, Clone)]
pub enum BoltRequest {
    /// HELLO - Initialize connection
    Hello(HelloMessage),
    /// LOGON - Authenticate (Bolt 5.1+)
    Logon(LogonMessage),
    /// LOGOFF - Deauthenticate (Bolt 5.1+)
    Logoff,
    /// GOODBYE - Close connection gracefully
    Goodbye,
    /// RESET - Acknowledge an interrupt and return to READY
    Reset,
    /// RUN - Execute a query
    Run(RunMessage),
    /// PULL - Pull results
    Pull(PullMessage),
    /// DISCARD - Discard results
    Discard(DiscardMessage),
    /// BEGIN - Start transaction
    Begin(BeginMessage),
    /// COMMIT - Commit transaction
    Commit,
    /// ROLLBACK - Rollback transaction
    Rollback,
}

impl BoltRequest {
    /// Get the payload-free kind.
    pub fn kind(&self) -> MessageKind {
        match self {
            BoltRequest::Hello(_) => MessageKind::Hello,
            BoltRequest::Logon(_) => MessageKind::Logon,
            BoltRequest::Logoff => MessageKind::Logoff,
            BoltRequest::Goodbye => MessageKind::Goodbye,
            BoltRequest::Reset => MessageKind::Reset,
            BoltRequest::Run(_) => MessageKind::Run,
            BoltRequest::Pull(_) => MessageKind::Pull,
            BoltRequest::Discard(_) => MessageKind::Discard,
            BoltRequest::Begin(_) => MessageKind::Begin,
            BoltRequest::Commit => MessageKind::Commit,
            BoltRequest::Rollback => MessageKind::Rollback,
        }
    }

    /// Get the message tag.
    pub fn tag(&self) -> u8 {
        self.kind().tag()
    }

    /// Get message name for logging.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Check if this is a RESET.
    pub fn is_reset(&self) -> bool {
        matches!(self, BoltRequest::Reset)
    }
}

/// HELLO message - Initialize connection.
#[derive(Debug, Clone)]
pub struct HelloMessage {
    /// User agent string
    pub user_agent: String,
    /// Authentication token (inline auth, Bolt < 5.1)
    pub auth: Option<AuthToken>,
    /// Routing context
    pub routing: Option<HashMap<String, BoltValue>>,
    /// Requested protocol patches (e.g. "utc")
    pub patch_bolt: Vec<String>,
    /// Additional extra data
    pub extra: HashMap<String, BoltValue>,
}

impl HelloMessage {
    /// Create a new HELLO message.
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            auth: None,
            routing: None,
            patch_bolt: Vec::new(),
            extra: HashMap::new(),
        }
    }

    /// Set authentication.
    pub fn with_auth(mut self, auth: AuthToken) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Request a protocol patch.
    pub fn with_patch(mut self, patch: &str) -> Self {
        self.patch_bolt.push(patch.to_string());
        self
    }

    /// Check if a patch was requested.
    pub fn requests_patch(&self, patch: &str) -> bool {
        self.patch_bolt.iter().any(|p| p == patch)
    }
}

/// LOGON message - Authenticate a connection (Bolt 5.1+).
#[derive(Debug, Clone)]
pub struct LogonMessage {
    /// Authentication token
    pub auth: AuthToken,
}

impl LogonMessage {
    /// Create a new LOGON message.
    pub fn new(auth: AuthToken) -> Self {
        Self { auth }
    }
}

/// RUN message - Execute a query.
///
/// Outside an explicit transaction the `extra` map carries the settings of
/// the implicit transaction (`db`, `bookmarks`, `tx_timeout`, `mode`,
/// `tx_metadata`).
#[derive(Debug, Clone)]
pub struct RunMessage {
    /// Cypher query string
    pub query: String,
    /// Query parameters
    pub parameters: HashMap<String, BoltValue>,
    /// Extra metadata
    pub extra: HashMap<String, BoltValue>,
}

impl RunMessage {
    /// Create a new RUN message.
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            parameters: HashMap::new(),
            extra: HashMap::new(),
        }
    }

    /// Set query parameters.
    pub fn with_parameters(mut self, params: HashMap<String, BoltValue>) -> Self {
        self.parameters = params;
        self
    }

    /// Set database name.
    pub fn with_database(mut self, db: &str) -> Self {
        self.extra.insert("db".to_string(), BoltValue::from(db));
        self
    }

    /// Set bookmark(s).
    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        let list = bookmarks.into_iter().map(BoltValue::String).collect();
        self.extra.insert("bookmarks".to_string(), BoltValue::List(list));
        self
    }

    /// Set access mode.
    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.extra.insert("mode".to_string(), BoltValue::from(mode.as_str()));
        self
    }

    /// Database requested in `extra`.
    pub fn database(&self) -> Option<&str> {
        self.extra.get("db").and_then(|v| v.as_str())
    }

    /// Bookmarks requested in `extra`.
    pub fn bookmarks(&self) -> Vec<String> {
        self.extra
            .get("bookmarks")
            .and_then(|v| v.as_string_list())
            .unwrap_or_default()
    }

    /// Access mode requested in `extra`.
    pub fn mode(&self) -> AccessMode {
        self.extra
            .get("mode")
            .and_then(|v| v.as_str())
            .map(AccessMode::from_str)
            .unwrap_or_default()
    }

    /// Transaction timeout requested in `extra` (milliseconds on the wire).
    pub fn tx_timeout(&self) -> Option<Duration> {
        self.extra
            .get("tx_timeout")
            .and_then(|v| v.as_int())
            .filter(|ms| *ms >= 0)
            .map(|ms| Duration::from_millis(ms as u64))
    }

    /// Transaction metadata requested in `extra`.
    pub fn tx_metadata(&self) -> HashMap<String, BoltValue> {
        self.extra
            .get("tx_metadata")
            .and_then(|v| v.as_map())
            .cloned()
            .unwrap_or_default()
    }
}

/// PULL message - Pull query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullMessage {
    /// Number of records to pull (-1 for all)
    pub n: i64,
    /// Query ID for multi-query results
    pub qid: Option<i64>,
}

impl PullMessage {
    /// Create a PULL ALL message.
    pub fn all() -> Self {
        Self { n: -1, qid: None }
    }

    /// Create a PULL with specific count.
    pub fn with_n(n: i64) -> Self {
        Self { n, qid: None }
    }

    /// Set query ID.
    pub fn with_qid(mut self, qid: i64) -> Self {
        self.qid = Some(qid);
        self
    }
}

/// DISCARD message - Discard query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscardMessage {
    /// Number of records to discard (-1 for all)
    pub n: i64,
    /// Query ID for multi-query results
    pub qid: Option<i64>,
}

impl DiscardMessage {
    /// Create a DISCARD ALL message.
    pub fn all() -> Self {
        Self { n: -1, qid: None }
    }

    /// Create a DISCARD with specific count.
    pub fn with_n(n: i64) -> Self {
        Self { n, qid: None }
    }
}

/// Check a PULL/DISCARD batch size: `-1` (all) or positive.
pub fn is_valid_batch_size(n: i64) -> bool {
    n == -1 || n > 0
}

/// BEGIN message - Start a transaction.
#[derive(Debug, Clone, Default)]
pub struct BeginMessage {
    /// Bookmarks to wait for
    pub bookmarks: Vec<String>,
    /// Transaction timeout
    pub tx_timeout: Option<Duration>,
    /// Access mode (read/write)
    pub mode: AccessMode,
    /// Database name
    pub database: Option<String>,
    /// Transaction metadata
    pub tx_metadata: HashMap<String, BoltValue>,
}

impl BeginMessage {
    /// Create a new BEGIN message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bookmarks.
    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.tx_timeout = Some(timeout);
        self
    }

    /// Set access mode.
    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set database.
    pub fn with_database(mut self, db: &str) -> Self {
        self.database = Some(db.to_string());
        self
    }

    /// Set transaction metadata.
    pub fn with_metadata(mut self, metadata: HashMap<String, BoltValue>) -> Self {
        self.tx_metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_mode() {
        assert_eq!(AccessMode::from_str("r"), AccessMode::Read);
        assert_eq!(AccessMode::from_str("READ"), AccessMode::Read);
        assert_eq!(AccessMode::from_str("w"), AccessMode::Write);
        assert_eq!(AccessMode::from_str("anything"), AccessMode::Write);
        assert_eq!(AccessMode::default(), AccessMode::Write);
    }

    #[test]
    fn test_auth_token_from_map() {
        let mut map = HashMap::new();
        map.insert("scheme".to_string(), BoltValue::from("basic"));
        map.insert("principal".to_string(), BoltValue::from("neo"));
        map.insert("credentials".to_string(), BoltValue::from("secret"));
        map.insert("ttl".to_string(), BoltValue::Integer(30));

        let auth = AuthToken::from_map(&map);
        assert_eq!(auth, {
            let mut expected = AuthToken::basic("neo", "secret");
            expected.parameters.insert("ttl".to_string(), BoltValue::Integer(30));
            expected
        });
    }

    #[test]
    fn test_auth_token_missing_scheme() {
        let auth = AuthToken::from_map(&HashMap::new());
        assert_eq!(auth.scheme, "none");
        assert!(auth.principal.is_none());
    }

    #[test]
    fn test_request_kind_and_tag() {
        assert_eq!(BoltRequest::Goodbye.tag(), tag::GOODBYE);
        assert_eq!(BoltRequest::Reset.kind(), MessageKind::Reset);
        assert_eq!(BoltRequest::Commit.name(), "COMMIT");
        assert_eq!(BoltRequest::Run(RunMessage::new("RETURN 1")).name(), "RUN");
        assert_eq!(BoltRequest::Pull(PullMessage::all()).tag(), tag::PULL);
        assert!(BoltRequest::Reset.is_reset());
        assert!(!BoltRequest::Logoff.is_reset());
    }

    #[test]
    fn test_hello_patches() {
        let hello = HelloMessage::new("Zeta4G/1.0")
            .with_auth(AuthToken::basic("zeta4g", "password"))
            .with_patch("utc");
        assert!(hello.requests_patch("utc"));
        assert!(!hello.requests_patch("other"));
        assert!(hello.auth.is_some());
    }

    #[test]
    fn test_run_extra_accessors() {
        let mut run = RunMessage::new("MATCH (n) RETURN n")
            .with_database("movies")
            .with_bookmarks(vec!["bm:1".to_string()])
            .with_mode(AccessMode::Read);
        run.extra.insert("tx_timeout".to_string(), BoltValue::Integer(1500));

        assert_eq!(run.database(), Some("movies"));
        assert_eq!(run.bookmarks(), vec!["bm:1".to_string()]);
        assert_eq!(run.mode(), AccessMode::Read);
        assert_eq!(run.tx_timeout(), Some(Duration::from_millis(1500)));
        assert!(run.tx_metadata().is_empty());
    }

    #[test]
    fn test_run_defaults() {
        let run = RunMessage::new("RETURN 1");
        assert_eq!(run.database(), None);
        assert!(run.bookmarks().is_empty());
        assert_eq!(run.mode(), AccessMode::Write);
        assert_eq!(run.tx_timeout(), None);
    }

    #[test]
    fn test_pull_discard() {
        assert_eq!(PullMessage::all().n, -1);
        assert_eq!(PullMessage::with_n(100).with_qid(1).qid, Some(1));
        assert_eq!(DiscardMessage::with_n(5).n, 5);
    }

    #[test]
    fn test_batch_size() {
        assert!(is_valid_batch_size(-1));
        assert!(is_valid_batch_size(1));
        assert!(!is_valid_batch_size(0));
        assert!(!is_valid_batch_size(-2));
    }

    #[test]
    fn test_begin_message() {
        let begin = BeginMessage::new()
            .with_database("zeta4g")
            .with_mode(AccessMode::Read)
            .with_timeout(Duration::from_secs(30));
        assert_eq!(begin.database.as_deref(), Some("zeta4g"));
        assert_eq!(begin.mode, AccessMode::Read);
        assert_eq!(begin.tx_timeout, Some(Duration::from_secs(30)));
        assert!(begin.bookmarks.is_empty());
    }
}
