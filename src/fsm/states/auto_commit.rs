//! AUTO_COMMIT: streaming the result of an implicit transaction.

use tracing::debug;

use crate::bolt::error::BoltResult;
use crate::bolt::message::BoltRequest;

use super::streaming::{self, StreamStep, StreamSummary};
use super::Outcome;
use crate::fsm::context::ConnectionContext;
use crate::fsm::response::{ResponseHandler, Terminal};
use crate::fsm::state::State;

pub(super) fn process(
    request: BoltRequest,
    ctx: &mut ConnectionContext,
    handler: &mut dyn ResponseHandler,
) -> BoltResult<Outcome> {
    let (mode, n, qid) = match streaming::batch(&request, State::AutoCommit) {
        Ok(batch) => batch,
        Err(outcome) => return Ok(outcome),
    };

    let outcome = match streaming::stream(mode, n, qid, ctx, handler)? {
        StreamStep::More => {
            Outcome::next(State::AutoCommit, Terminal::Success(streaming::has_more()))
        }
        StreamStep::Exhausted(summary) => commit(summary, ctx),
        StreamStep::Failed(e) => {
            // Rollback failures are logged by the context; the statement error wins.
            let _ = ctx.rollback_transaction();
            Outcome::failed(&e)
        }
    };
    Ok(outcome)
}

fn commit(summary: StreamSummary, ctx: &mut ConnectionContext) -> Outcome {
    let Some(tx) = ctx.transaction.take() else {
        return Outcome::next(State::Ready, Terminal::Success(summary.into_success("")));
    };

    let id = tx.id();
    let db = tx.database().to_string();
    match tx.commit() {
        Ok(bookmark) => {
            debug!(
                "{}: auto-commit transaction {} committed ({})",
                ctx.connection_id, id, bookmark
            );
            let success = summary.into_success(&db).with("bookmark", bookmark.value());
            Outcome::next(State::Ready, Terminal::Success(success))
        }
        Err(e) => Outcome::failed(&e),
    }
}
