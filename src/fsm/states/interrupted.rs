//! INTERRUPTED: everything is IGNORED until RESET drains the interrupts.

use tracing::debug;

use crate::bolt::message::BoltRequest;

use super::Outcome;
use crate::fsm::context::ConnectionContext;
use crate::fsm::response::Terminal;
use crate::fsm::state::State;

pub(super) fn process(request: BoltRequest, ctx: &mut ConnectionContext) -> Outcome {
    if !request.is_reset() {
        return Outcome::next(State::Interrupted, Terminal::Ignored);
    }

    let remaining = ctx.signals.acknowledge_interrupt();
    if remaining > 0 {
        debug!(
            "{}: RESET acknowledged one interrupt, {} pending",
            ctx.connection_id, remaining
        );
        return Outcome::next(State::Interrupted, Terminal::Ignored);
    }

    // Failures queued before the interrupt are superseded by the reset.
    ctx.signals.take_pending_failure();
    match ctx.rollback_transaction() {
        Ok(()) => Outcome::next(State::Ready, Terminal::success()),
        Err(e) => Outcome::Fatal(e.to_failure()),
    }
}
