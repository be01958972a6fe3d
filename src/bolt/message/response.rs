//! Bolt protocol response messages.
//!
//! Response messages are sent from the server to the client.

use std::collections::HashMap;
use std::fmt;

use super::tag;
use crate::bolt::error::Status;
use crate::bolt::value::BoltValue;

/// All Bolt response messages.
#[derive(Debug, Clone, PartialEq)]
pub enum BoltResponse {
    /// SUCCESS - Operation completed successfully
    Success(SuccessMessage),
    /// RECORD - Query result record
    Record(RecordMessage),
    /// FAILURE - Operation failed
    Failure(FailureMessage),
    /// IGNORED - Message was ignored (session FAILED or INTERRUPTED)
    Ignored,
}

impl BoltResponse {
    /// Get the message tag.
    pub fn tag(&self) -> u8 {
        match self {
            BoltResponse::Success(_) => tag::SUCCESS,
            BoltResponse::Record(_) => tag::RECORD,
            BoltResponse::Failure(_) => tag::FAILURE,
            BoltResponse::Ignored => tag::IGNORED,
        }
    }

    /// Get message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltResponse::Success(_) => "SUCCESS",
            BoltResponse::Record(_) => "RECORD",
            BoltResponse::Failure(_) => "FAILURE",
            BoltResponse::Ignored => "IGNORED",
        }
    }

    /// Check if this is a success response.
    pub fn is_success(&self) -> bool {
        matches!(self, BoltResponse::Success(_))
    }

    /// Check if this is a failure response.
    pub fn is_failure(&self) -> bool {
        matches!(self, BoltResponse::Failure(_))
    }

    /// Check if this is a record response.
    pub fn is_record(&self) -> bool {
        matches!(self, BoltResponse::Record(_))
    }

    /// Check if this ends the response to one request.
    pub fn is_terminal(&self) -> bool {
        !self.is_record()
    }
}

/// SUCCESS message - Operation completed successfully.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuccessMessage {
    /// Response metadata
    pub metadata: HashMap<String, BoltValue>,
}

impl SuccessMessage {
    /// Create a new SUCCESS message with empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style metadata entry.
    pub fn with(mut self, key: &str, value: impl Into<BoltValue>) -> Self {
        self.add(key, value);
        self
    }

    /// Add metadata entry.
    pub fn add(&mut self, key: &str, value: impl Into<BoltValue>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    /// Get metadata entry.
    pub fn get(&self, key: &str) -> Option<&BoltValue> {
        self.metadata.get(key)
    }

    /// Check if a metadata entry is present.
    pub fn contains(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    /// Get server name.
    pub fn server(&self) -> Option<&str> {
        self.get("server").and_then(|v| v.as_str())
    }

    /// Get connection id.
    pub fn connection_id(&self) -> Option<&str> {
        self.get("connection_id").and_then(|v| v.as_str())
    }

    /// Get field names from RUN success.
    pub fn fields(&self) -> Option<Vec<String>> {
        self.get("fields").and_then(|v| v.as_string_list())
    }

    /// Milliseconds until the result was available.
    pub fn t_first(&self) -> Option<i64> {
        self.get("t_first").and_then(|v| v.as_int())
    }

    /// Milliseconds spent consuming the result.
    pub fn t_last(&self) -> Option<i64> {
        self.get("t_last").and_then(|v| v.as_int())
    }

    /// Check if more records are available.
    pub fn has_more(&self) -> bool {
        self.get("has_more")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Get bookmark.
    pub fn bookmark(&self) -> Option<&str> {
        self.get("bookmark").and_then(|v| v.as_str())
    }

    /// Get database name.
    pub fn db(&self) -> Option<&str> {
        self.get("db").and_then(|v| v.as_str())
    }

    /// Get query id.
    pub fn qid(&self) -> Option<i64> {
        self.get("qid").and_then(|v| v.as_int())
    }

    /// Check if the authenticated credentials have expired.
    pub fn credentials_expired(&self) -> bool {
        self.get("credentials_expired")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// RECORD message - Query result record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMessage {
    /// Record field values
    pub fields: Vec<BoltValue>,
}

impl RecordMessage {
    /// Create a new RECORD message.
    pub fn new(fields: Vec<BoltValue>) -> Self {
        Self { fields }
    }

    /// Get number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get field by index.
    pub fn get(&self, index: usize) -> Option<&BoltValue> {
        self.fields.get(index)
    }
}

/// FAILURE message - Operation failed.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureMessage {
    /// Status code
    pub status: Status,
    /// Error message
    pub message: String,
}

impl FailureMessage {
    /// Create a new FAILURE message.
    pub fn new(status: Status, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    /// Create a Request.Invalid failure.
    pub fn invalid_request(message: &str) -> Self {
        Self::new(Status::RequestInvalid, message)
    }

    /// Full status code string.
    pub fn code(&self) -> &'static str {
        self.status.code()
    }

    /// Check if this is a transient error.
    pub fn is_transient(&self) -> bool {
        self.status.is_transient()
    }
}

impl fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status.code(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_builder() {
        let success = SuccessMessage::new()
            .with("server", "Zeta4G/1.17.0")
            .with("connection_id", "bolt-1")
            .with("has_more", true);

        assert_eq!(success.server(), Some("Zeta4G/1.17.0"));
        assert_eq!(success.connection_id(), Some("bolt-1"));
        assert!(success.has_more());
        assert!(!success.credentials_expired());
        assert!(success.bookmark().is_none());
    }

    #[test]
    fn test_success_run_metadata() {
        let fields = BoltValue::List(vec![BoltValue::from("name"), BoltValue::from("age")]);
        let success = SuccessMessage::new()
            .with("fields", fields)
            .with("t_first", 3i64)
            .with("qid", 0i64);

        assert_eq!(
            success.fields(),
            Some(vec!["name".to_string(), "age".to_string()])
        );
        assert_eq!(success.t_first(), Some(3));
        assert_eq!(success.qid(), Some(0));
    }

    #[test]
    fn test_success_streaming_metadata() {
        let success = SuccessMessage::new()
            .with("bookmark", "bm:42")
            .with("db", "zeta4g")
            .with("t_last", 1i64);

        assert!(!success.has_more());
        assert_eq!(success.bookmark(), Some("bm:42"));
        assert_eq!(success.db(), Some("zeta4g"));
        assert_eq!(success.t_last(), Some(1));
        assert!(success.contains("db"));
    }

    #[test]
    fn test_record_message() {
        let record = RecordMessage::new(vec![BoltValue::Integer(1), BoltValue::Null]);
        assert_eq!(record.len(), 2);
        assert!(!record.is_empty());
        assert_eq!(record.get(0), Some(&BoltValue::Integer(1)));
        assert_eq!(record.get(2), None);
    }

    #[test]
    fn test_failure_message() {
        let failure = FailureMessage::new(Status::StatementSyntaxError, "Invalid input");
        assert_eq!(failure.code(), "Neo.ClientError.Statement.SyntaxError");
        assert!(!failure.is_transient());
        assert_eq!(
            failure.to_string(),
            "Neo.ClientError.Statement.SyntaxError: Invalid input"
        );
        assert_eq!(
            FailureMessage::invalid_request("nope").status,
            Status::RequestInvalid
        );
    }

    #[test]
    fn test_bolt_response_helpers() {
        let success = BoltResponse::Success(SuccessMessage::new());
        let record = BoltResponse::Record(RecordMessage::new(vec![]));
        let failure = BoltResponse::Failure(FailureMessage::invalid_request("x"));

        assert!(success.is_success() && success.is_terminal());
        assert!(record.is_record() && !record.is_terminal());
        assert!(failure.is_failure());
        assert!(BoltResponse::Ignored.is_terminal());
        assert_eq!(BoltResponse::Ignored.tag(), tag::IGNORED);
        assert_eq!(failure.name(), "FAILURE");
    }
}
