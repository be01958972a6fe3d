//! Bolt protocol error types and status codes.

use std::fmt;
use std::io;

use thiserror::Error;

use super::message::FailureMessage;

/// Result type for Bolt operations.
pub type BoltResult<T> = Result<T, BoltError>;

/// Bolt session errors.
#[derive(Error, Debug)]
pub enum BoltError {
    /// I/O error while writing a response
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure classified by a status code (execution, auth, transaction...)
    #[error("{status}: {message}")]
    Status {
        /// Status code
        status: Status,
        /// Human readable message
        message: String,
    },

    /// Request sent out of sequence
    #[error("{request} cannot be handled by a session in the {state} state.")]
    InvalidRequest {
        /// Request name (e.g. "RUN")
        request: &'static str,
        /// State name (e.g. "READY")
        state: &'static str,
    },

    /// Connection closed
    #[error("Connection closed")]
    ConnectionClosed,
}

impl BoltError {
    /// Create a status error.
    pub fn status(status: Status, message: impl Into<String>) -> Self {
        BoltError::Status {
            status,
            message: message.into(),
        }
    }

    /// Create a syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::status(Status::StatementSyntaxError, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::status(Status::SecurityUnauthorized, message)
    }

    /// Create a transaction terminated error.
    pub fn terminated(message: impl Into<String>) -> Self {
        Self::status(Status::TransactionTerminated, message)
    }

    /// The status this error reports to the client.
    pub fn status_kind(&self) -> Status {
        match self {
            BoltError::Status { status, .. } => *status,
            BoltError::InvalidRequest { .. } => Status::RequestInvalid,
            BoltError::Io(_) | BoltError::ConnectionClosed => Status::GeneralUnknownError,
        }
    }

    /// Check if this error is an I/O fault.
    pub fn is_io(&self) -> bool {
        matches!(self, BoltError::Io(_))
    }

    /// Convert error to a FAILURE message.
    pub fn to_failure(&self) -> FailureMessage {
        match self {
            BoltError::Status { status, message } => FailureMessage::new(*status, message),
            BoltError::InvalidRequest { .. } => {
                FailureMessage::new(Status::RequestInvalid, &self.to_string())
            }
            _ => FailureMessage::new(Status::GeneralUnknownError, &self.to_string()),
        }
    }
}

/// Status code classification (second segment of the code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The client sent something wrong; do not retry unchanged
    ClientError,
    /// Temporary condition; retry may succeed
    TransientError,
    /// The database failed; the client is not at fault
    DatabaseError,
}

impl Classification {
    /// Name as it appears in status codes.
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::ClientError => "ClientError",
            Classification::TransientError => "TransientError",
            Classification::DatabaseError => "DatabaseError",
        }
    }
}

/// Status codes reported in FAILURE messages.
///
/// Codes follow the `Neo.{Classification}.{Category}.{Title}` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Request sent out of sequence or malformed
    RequestInvalid,
    /// No worker capacity to accept the request
    RequestNoThreadsAvailable,
    /// Bad credentials
    SecurityUnauthorized,
    /// Credentials must be changed before use
    SecurityCredentialsExpired,
    /// Authentication provider failed
    SecurityAuthProviderFailed,
    /// Authentication provider timed out
    SecurityAuthProviderTimeout,
    /// Query syntax error
    StatementSyntaxError,
    /// Query semantic error
    StatementSemanticError,
    /// Missing query parameter
    StatementParameterMissing,
    /// Query execution failed
    StatementExecutionFailed,
    /// Constraint violation
    SchemaConstraintValidationFailed,
    /// Database does not exist
    DatabaseNotFound,
    /// Transaction was terminated by the server
    TransactionTerminated,
    /// Transaction exceeded its timeout
    TransactionTimedOut,
    /// Transaction could not be started
    TransactionStartFailed,
    /// Commit failed in the store
    TransactionCommitFailed,
    /// Rollback failed in the store
    TransactionRollbackFailed,
    /// Anything else
    GeneralUnknownError,
}

impl Status {
    const ALL: [Status; 18] = [
        Status::RequestInvalid,
        Status::RequestNoThreadsAvailable,
        Status::SecurityUnauthorized,
        Status::SecurityCredentialsExpired,
        Status::SecurityAuthProviderFailed,
        Status::SecurityAuthProviderTimeout,
        Status::StatementSyntaxError,
        Status::StatementSemanticError,
        Status::StatementParameterMissing,
        Status::StatementExecutionFailed,
        Status::SchemaConstraintValidationFailed,
        Status::DatabaseNotFound,
        Status::TransactionTerminated,
        Status::TransactionTimedOut,
        Status::TransactionStartFailed,
        Status::TransactionCommitFailed,
        Status::TransactionRollbackFailed,
        Status::GeneralUnknownError,
    ];

    /// Full status code string.
    pub fn code(self) -> &'static str {
        match self {
            Status::RequestInvalid => "Neo.ClientError.Request.Invalid",
            Status::RequestNoThreadsAvailable => "Neo.TransientError.Request.NoThreadsAvailable",
            Status::SecurityUnauthorized => "Neo.ClientError.Security.Unauthorized",
            Status::SecurityCredentialsExpired => "Neo.ClientError.Security.CredentialsExpired",
            Status::SecurityAuthProviderFailed => "Neo.ClientError.Security.AuthProviderFailed",
            Status::SecurityAuthProviderTimeout => {
                "Neo.TransientError.Security.AuthProviderTimeout"
            }
            Status::StatementSyntaxError => "Neo.ClientError.Statement.SyntaxError",
            Status::StatementSemanticError => "Neo.ClientError.Statement.SemanticError",
            Status::StatementParameterMissing => "Neo.ClientError.Statement.ParameterMissing",
            Status::StatementExecutionFailed => "Neo.DatabaseError.Statement.ExecutionFailed",
            Status::SchemaConstraintValidationFailed => {
                "Neo.ClientError.Schema.ConstraintValidationFailed"
            }
            Status::DatabaseNotFound => "Neo.ClientError.Database.DatabaseNotFound",
            Status::TransactionTerminated => "Neo.TransientError.Transaction.Terminated",
            Status::TransactionTimedOut => "Neo.TransientError.Transaction.TransactionTimedOut",
            Status::TransactionStartFailed => {
                "Neo.DatabaseError.Transaction.TransactionStartFailed"
            }
            Status::TransactionCommitFailed => {
                "Neo.DatabaseError.Transaction.TransactionCommitFailed"
            }
            Status::TransactionRollbackFailed => {
                "Neo.DatabaseError.Transaction.TransactionRollbackFailed"
            }
            Status::GeneralUnknownError => "Neo.DatabaseError.General.UnknownError",
        }
    }

    /// Parse a status from its code string.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Classification of this status.
    pub fn classification(self) -> Classification {
        match self.code().split('.').nth(1) {
            Some("TransientError") => Classification::TransientError,
            Some("DatabaseError") => Classification::DatabaseError,
            _ => Classification::ClientError,
        }
    }

    /// Category segment (e.g. "Statement").
    pub fn category(self) -> &'static str {
        self.code().split('.').nth(2).unwrap_or("General")
    }

    /// Check if a retry may succeed.
    pub fn is_transient(self) -> bool {
        self.classification() == Classification::TransientError
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
