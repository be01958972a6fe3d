//! Session states and the message legality table.

use std::fmt;

use crate::bolt::message::MessageKind;
use crate::bolt::version::BoltVersion;

/// Bolt session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Initial state for protocol versions that authenticate inside HELLO
    Connected,
    /// Initial state for protocol versions with a separate LOGON step
    Negotiation,
    /// HELLO accepted, waiting for LOGON
    Authentication,
    /// Authenticated and idle
    Ready,
    /// Streaming the result of an implicit transaction
    AutoCommit,
    /// Inside an explicit transaction
    InTransaction,
    /// A request failed; waiting for the client to reset
    Failed,
    /// An interrupt is pending; waiting for RESET
    Interrupted,
}

impl State {
    /// Every state.
    pub const ALL: [State; 8] = [
        State::Connected,
        State::Negotiation,
        State::Authentication,
        State::Ready,
        State::AutoCommit,
        State::InTransaction,
        State::Failed,
        State::Interrupted,
    ];

    /// Initial state for a negotiated protocol version.
    pub fn initial(version: BoltVersion) -> Self {
        if version.supports_logon() {
            State::Negotiation
        } else {
            State::Connected
        }
    }

    /// State name as reported in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            State::Connected => "CONNECTED",
            State::Negotiation => "NEGOTIATION",
            State::Authentication => "AUTHENTICATION",
            State::Ready => "READY",
            State::AutoCommit => "AUTO_COMMIT",
            State::InTransaction => "IN_TRANSACTION",
            State::Failed => "FAILED",
            State::Interrupted => "INTERRUPTED",
        }
    }

    /// Check if no principal is authenticated yet in this state.
    pub fn is_pre_authentication(self) -> bool {
        matches!(
            self,
            State::Connected | State::Negotiation | State::Authentication
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a state does with a request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Legality {
    /// The state handler processes the request
    Handle,
    /// Answered with IGNORED, nothing else happens
    Ignore,
    /// Protocol violation; FAILURE(Request.Invalid) then the connection is killed
    Reject,
}

/// Legality of `kind` in `state`.
pub fn legality(state: State, kind: MessageKind, version: BoltVersion) -> Legality {
    use MessageKind::*;

    match state {
        State::Connected | State::Negotiation => match kind {
            Hello => Legality::Handle,
            _ => Legality::Reject,
        },
        State::Authentication => match kind {
            Logon | Goodbye => Legality::Handle,
            _ => Legality::Reject,
        },
        State::Ready => match kind {
            Run | Begin | Goodbye => Legality::Handle,
            Logoff if version.supports_logon() => Legality::Handle,
            _ => Legality::Reject,
        },
        State::AutoCommit => match kind {
            Pull | Discard => Legality::Handle,
            _ => Legality::Reject,
        },
        State::InTransaction => match kind {
            Run | Pull | Discard | Commit | Rollback => Legality::Handle,
            _ => Legality::Reject,
        },
        State::Failed => match kind {
            Run | Pull | Discard | Commit | Rollback => Legality::Ignore,
            _ => Legality::Reject,
        },
        State::Interrupted => match kind {
            Reset => Legality::Handle,
            _ => Legality::Ignore,
        },
    }
}
