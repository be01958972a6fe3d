//! Bolt session state machine.
//!
//! One [`BoltStateMachine`] per connection. It validates every request
//! against the current [`State`], drives the transaction and authentication
//! collaborators from [`spi`], and reports results through a
//! [`ResponseHandler`]. Interrupts, termination and queued failures are
//! raised from other threads through a [`MachineHandle`].
//!
//! ```text
//! CONNECTED/NEGOTIATION --HELLO--> AUTHENTICATION --LOGON--> READY
//! READY --RUN--> AUTO_COMMIT --PULL/DISCARD (exhausted)--> READY
//! READY --BEGIN--> IN_TRANSACTION --COMMIT/ROLLBACK--> READY
//! any --error--> FAILED --interrupt--> INTERRUPTED --RESET--> READY
//! ```

mod context;
mod machine;
mod response;
pub mod spi;
mod state;
mod states;

#[cfg(test)]
pub(crate) mod testkit;

pub use context::{ConnectionContext, ConnectionSignals, Principal};
pub use machine::{BoltStateMachine, MachineHandle};
pub use response::{BoltResponseRecorder, RecordedResponse, ResponseHandler, Terminal};
pub use spi::{
    AuthVerdict, AuthenticationVerifier, RecordBatch, SessionObserver, StatementMetadata,
    TransactionHandle, TransactionKind, TransactionManager, TransactionRequest,
};
pub use state::{legality, Legality, State};
