//! # Bolt Protocol Types
//!
//! Session-level Bolt protocol types shared by the state machine and the
//! connection worker.
//!
//! ## Overview
//!
//! Byte-level framing and PackStream decoding happen before a request reaches
//! the session. This module holds what is left once that is done:
//!
//! - **Values** - the decoded value model
//! - **Messages** - request/response messages, status codes and metadata
//! - **Versions** - negotiated protocol version and its capabilities
//!
//! ## Submodules
//!
//! - [`value`] - Decoded values
//! - [`message`] - Bolt message types (HELLO, RUN, PULL, etc.)
//! - [`version`] - Protocol versions
//! - [`error`] - Error types and status codes

pub mod error;
pub mod message;
pub mod value;
pub mod version;

pub use error::{BoltError, BoltResult, Classification, Status};
pub use message::{
    is_valid_batch_size, AccessMode, AuthToken, BeginMessage, BoltRequest, BoltResponse,
    Bookmark, DiscardMessage, FailureMessage, HelloMessage, LogonMessage, MessageKind,
    PullMessage, QueryStats, QueryType, RecordMessage, RunMessage, SuccessMessage,
};
pub use value::BoltValue;
pub use version::BoltVersion;
