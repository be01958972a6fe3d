//! Per-state request handlers.
//!
//! The dispatcher only calls a handler for requests the legality table
//! marks as handled in that state. Handlers compute an [`Outcome`]; the
//! dispatcher applies it.

mod authentication;
mod auto_commit;
mod connected;
mod in_transaction;
mod interrupted;
mod ready;
mod streaming;

use crate::bolt::error::{BoltError, BoltResult};
use crate::bolt::message::{BoltRequest, FailureMessage};

use super::context::ConnectionContext;
use super::response::{ResponseHandler, Terminal};
use super::state::State;

/// What processing one request decided.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
    /// Move to `state` and send `response`
    Next {
        /// New state
        state: State,
        /// Terminal response
        response: Terminal,
    },
    /// Send the failure, then kill the connection
    Fatal(FailureMessage),
    /// Close the connection without a response
    Close,
}

impl Outcome {
    pub(crate) fn next(state: State, response: Terminal) -> Self {
        Outcome::Next { state, response }
    }

    /// Recoverable failure: FAILURE, then FAILED.
    pub(crate) fn failed(error: &BoltError) -> Self {
        Outcome::Next {
            state: State::Failed,
            response: Terminal::Failure(error.to_failure()),
        }
    }

    /// Request that should not have reached this handler.
    pub(crate) fn invalid(request: &BoltRequest, state: State) -> Self {
        let error = BoltError::InvalidRequest {
            request: request.name(),
            state: state.name(),
        };
        Outcome::Fatal(error.to_failure())
    }
}

/// Run the handler of `state`.
///
/// `Err` only for I/O faults while emitting records.
pub(crate) fn dispatch(
    state: State,
    request: BoltRequest,
    ctx: &mut ConnectionContext,
    handler: &mut dyn ResponseHandler,
) -> BoltResult<Outcome> {
    match state {
        State::Connected | State::Negotiation => Ok(connected::process(state, request, ctx)),
        State::Authentication => Ok(authentication::process(request, ctx)),
        State::Ready => Ok(ready::process(request, ctx)),
        State::AutoCommit => auto_commit::process(request, ctx, handler),
        State::InTransaction => in_transaction::process(request, ctx, handler),
        State::Interrupted => Ok(interrupted::process(request, ctx)),
        State::Failed => Ok(Outcome::next(State::Failed, Terminal::Ignored)),
    }
}
