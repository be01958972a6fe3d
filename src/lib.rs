//! # Zeta4G Bolt Session
//!
//! Server-side Bolt session state machine for the
//! [Zeta4G](https://github.com/zeta9044/zeta4g) graph database.
//!
//! ## Features
//!
//! - **Bolt 4.0 - 5.4** - HELLO/LOGON/LOGOFF handshakes, version-dependent capabilities
//! - **Explicit and auto-commit transactions** - driven through pluggable collaborators
//! - **Interrupt/RESET protocol** - stacked interrupts, each acknowledged by one RESET
//! - **Async connection worker** - Tokio-driven request queue with RESET call-ahead
//! - **Administrative control** - terminate connections by id or by owner
//!
//! ## Quick Start
//!
//! The query engine and the credential store live outside this crate. Plug
//! them in by implementing [`TransactionManager`] and [`AuthenticationVerifier`]:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use zeta4g_bolt_session::{
//!     BoltConnection, BoltRequest, BoltStateMachine, BoltVersion, HelloMessage,
//!     SessionConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let machine = BoltStateMachine::new(
//!         BoltVersion::V5_4,
//!         Arc::new(SessionConfig::default()),
//!         Arc::new(MyTransactions::new()),
//!         Arc::new(MyVerifier::new()),
//!     );
//!
//!     let (connection, mut responses) = BoltConnection::spawn(machine);
//!     connection.enqueue(BoltRequest::Hello(HelloMessage::new("app/1.0")))?;
//!
//!     use tokio_stream::StreamExt;
//!     while let Some(response) = responses.next().await {
//!         println!("{}", response.name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Driving the machine directly
//!
//! [`BoltStateMachine::process`] is synchronous. Any [`ResponseHandler`]
//! receives the records and the terminal response of each request;
//! [`BoltResponseRecorder`] keeps them in memory.
//!
//! ```rust,ignore
//! let mut recorder = BoltResponseRecorder::new();
//! machine.process(BoltRequest::Run(RunMessage::new("RETURN 1")), &mut recorder)?;
//! let response = recorder.next_response().unwrap();
//! assert!(response.success().is_some());
//! ```
//!
//! ## Modules
//!
//! - [`bolt`] - Protocol types: values, messages, versions, status codes
//! - [`fsm`] - The session state machine and its collaborator traits
//! - [`server`] - Connection worker and connection registry
//! - [`config`] - Session configuration
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bolt;
pub mod config;
pub mod fsm;
pub mod server;

// Re-exports for convenience
pub use bolt::{
    AccessMode, AuthToken, BeginMessage, BoltError, BoltRequest, BoltResponse, BoltResult,
    BoltValue, BoltVersion, Bookmark, DiscardMessage, FailureMessage, HelloMessage,
    LogonMessage, PullMessage, QueryStats, QueryType, RecordMessage, RunMessage, Status,
    SuccessMessage,
};

pub use config::{SessionConfig, SessionConfigBuilder};

pub use fsm::{
    AuthVerdict, AuthenticationVerifier, BoltResponseRecorder, BoltStateMachine, MachineHandle,
    RecordBatch, RecordedResponse, ResponseHandler, SessionObserver, State, StatementMetadata,
    TransactionHandle, TransactionKind, TransactionManager, TransactionRequest,
};

pub use server::{BoltConnection, ConnectionRegistry};
