//! IN_TRANSACTION: inside an explicit transaction.
//!
//! Statement failures leave the transaction associated; only COMMIT,
//! ROLLBACK or the final RESET let go of it.

use std::time::Instant;

use tracing::{debug, warn};

use crate::bolt::error::{BoltError, BoltResult, Status};
use crate::bolt::message::{BoltRequest, FailureMessage, RunMessage, SuccessMessage};

use super::ready::{check_credentials, run_success};
use super::streaming::{self, StreamStep};
use super::Outcome;
use crate::fsm::context::ConnectionContext;
use crate::fsm::response::{ResponseHandler, Terminal};
use crate::fsm::state::State;

const TERMINATED_MESSAGE: &str = "The transaction has been terminated. Retry your operation in a new transaction, and you should see a successful result.";

pub(super) fn process(
    request: BoltRequest,
    ctx: &mut ConnectionContext,
    handler: &mut dyn ResponseHandler,
) -> BoltResult<Outcome> {
    if matches!(request, BoltRequest::Pull(_) | BoltRequest::Discard(_)) {
        return stream(&request, ctx, handler);
    }

    let outcome = match request {
        BoltRequest::Run(run) => terminated(ctx).unwrap_or_else(|| run_statement(run, ctx)),
        BoltRequest::Commit => terminated(ctx).unwrap_or_else(|| commit(ctx)),
        BoltRequest::Rollback => rollback(ctx),
        other => Outcome::invalid(&other, State::InTransaction),
    };
    Ok(outcome)
}

/// FAILURE for a transaction terminated server-side. The transaction stays
/// associated until RESET.
fn terminated(ctx: &ConnectionContext) -> Option<Outcome> {
    let status = ctx.transaction.as_ref()?.termination_reason()?;
    Some(Outcome::next(
        State::Failed,
        Terminal::Failure(FailureMessage::new(status, TERMINATED_MESSAGE)),
    ))
}

fn no_transaction() -> Outcome {
    Outcome::failed(&BoltError::status(
        Status::GeneralUnknownError,
        "No transaction is associated with the session.",
    ))
}

fn run_statement(run: RunMessage, ctx: &mut ConnectionContext) -> Outcome {
    if let Err(e) = check_credentials(&run.query, ctx) {
        return Outcome::failed(&e);
    }
    let Some(tx) = ctx.transaction.as_mut() else {
        return no_transaction();
    };

    let started = Instant::now();
    match tx.run(&run.query, &run.parameters) {
        Ok(metadata) => {
            let qid = ctx.next_qid;
            ctx.next_qid += 1;
            ctx.open_statement(metadata.query_type, Some(qid));
            let success = run_success(metadata.fields, started).with("qid", qid);
            Outcome::next(State::InTransaction, Terminal::Success(success))
        }
        Err(e) => Outcome::failed(&e),
    }
}

fn stream(
    request: &BoltRequest,
    ctx: &mut ConnectionContext,
    handler: &mut dyn ResponseHandler,
) -> BoltResult<Outcome> {
    let (mode, n, qid) = match streaming::batch(request, State::InTransaction) {
        Ok(batch) => batch,
        Err(outcome) => return Ok(outcome),
    };
    if let Some(outcome) = terminated(ctx) {
        return Ok(outcome);
    }

    let outcome = match streaming::stream(mode, n, qid, ctx, handler)? {
        StreamStep::More => Outcome::next(
            State::InTransaction,
            Terminal::Success(streaming::has_more()),
        ),
        StreamStep::Exhausted(summary) => {
            let db = ctx
                .transaction
                .as_ref()
                .map(|tx| tx.database().to_string())
                .unwrap_or_default();
            Outcome::next(
                State::InTransaction,
                Terminal::Success(summary.into_success(&db)),
            )
        }
        StreamStep::Failed(e) => Outcome::failed(&e),
    };
    Ok(outcome)
}

fn commit(ctx: &mut ConnectionContext) -> Outcome {
    ctx.statement = None;
    let Some(tx) = ctx.transaction.take() else {
        return no_transaction();
    };

    let id = tx.id();
    match tx.commit() {
        Ok(bookmark) => {
            debug!("{}: transaction {} committed ({})", ctx.connection_id, id, bookmark);
            let success = SuccessMessage::new().with("bookmark", bookmark.value());
            Outcome::next(State::Ready, Terminal::Success(success))
        }
        Err(e) => {
            warn!("{}: commit of transaction {} failed: {}", ctx.connection_id, id, e);
            Outcome::failed(&e)
        }
    }
}

fn rollback(ctx: &mut ConnectionContext) -> Outcome {
    if ctx.transaction.is_none() {
        return no_transaction();
    }
    match ctx.rollback_transaction() {
        Ok(()) => Outcome::next(State::Ready, Terminal::success()),
        Err(e) => Outcome::failed(&e),
    }
}
