//! PULL/DISCARD handling shared by AUTO_COMMIT and IN_TRANSACTION.

use tracing::trace;

use crate::bolt::error::{BoltError, BoltResult, Status};
use crate::bolt::message::{
    is_valid_batch_size, BoltRequest, FailureMessage, QueryStats, QueryType, SuccessMessage,
};

use super::Outcome;
use crate::fsm::context::ConnectionContext;
use crate::fsm::response::ResponseHandler;
use crate::fsm::state::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StreamMode {
    Pull,
    Discard,
}

/// How far a PULL/DISCARD got.
#[derive(Debug)]
pub(super) enum StreamStep {
    More,
    Exhausted(StreamSummary),
    Failed(BoltError),
}

#[derive(Debug)]
pub(super) struct StreamSummary {
    query_type: QueryType,
    t_last: i64,
    stats: QueryStats,
}

impl StreamSummary {
    /// SUCCESS metadata for an exhausted result. Never carries a bookmark.
    pub(super) fn into_success(self, db: &str) -> SuccessMessage {
        let mut success = SuccessMessage::new()
            .with("t_last", self.t_last)
            .with("type", self.query_type.as_str())
            .with("db", db);
        let stats = self.stats.to_map();
        if !stats.is_empty() {
            success.add("stats", stats);
        }
        success
    }
}

/// SUCCESS for a result with records left.
pub(super) fn has_more() -> SuccessMessage {
    SuccessMessage::new().with("has_more", true)
}

/// Extract and validate the batch size and target statement of a PULL/DISCARD.
pub(super) fn batch(
    request: &BoltRequest,
    state: State,
) -> Result<(StreamMode, i64, Option<i64>), Outcome> {
    let (mode, n, qid) = match request {
        BoltRequest::Pull(pull) => (StreamMode::Pull, pull.n, pull.qid),
        BoltRequest::Discard(discard) => (StreamMode::Discard, discard.n, discard.qid),
        other => return Err(Outcome::invalid(other, state)),
    };
    if !is_valid_batch_size(n) {
        return Err(Outcome::Fatal(FailureMessage::invalid_request(&format!(
            "Expecting {} size n to be -1 or a positive number, but got: {}",
            request.name(),
            n
        ))));
    }
    Ok((mode, n, qid))
}

/// Move the result of statement `qid` forward by `n` records.
///
/// Only the latest statement has an open result. Collaborator failures
/// come back as [`StreamStep::Failed`]; `Err` is an I/O fault from the
/// response handler.
pub(super) fn stream(
    mode: StreamMode,
    n: i64,
    qid: Option<i64>,
    ctx: &mut ConnectionContext,
    handler: &mut dyn ResponseHandler,
) -> BoltResult<StreamStep> {
    let (Some(statement), Some(tx)) = (ctx.statement, ctx.transaction.as_mut()) else {
        return Ok(StreamStep::Failed(BoltError::status(
            Status::RequestInvalid,
            "No result available to stream.",
        )));
    };
    if !statement.answers(qid) {
        return Ok(StreamStep::Failed(BoltError::status(
            Status::RequestInvalid,
            format!(
                "No open result for statement id {}.",
                qid.unwrap_or_default()
            ),
        )));
    }

    let has_more = match mode {
        StreamMode::Pull => match tx.pull(n) {
            Ok(batch) => {
                trace!(
                    "{}: streaming {} records (has_more: {})",
                    ctx.connection_id,
                    batch.records.len(),
                    batch.has_more
                );
                for record in batch.records {
                    handler.on_record(record)?;
                }
                if let Some(e) = batch.error {
                    ctx.statement = None;
                    return Ok(StreamStep::Failed(e));
                }
                batch.has_more
            }
            Err(e) => return Ok(StreamStep::Failed(e)),
        },
        StreamMode::Discard => match tx.discard(n) {
            Ok(has_more) => has_more,
            Err(e) => return Ok(StreamStep::Failed(e)),
        },
    };

    if has_more {
        return Ok(StreamStep::More);
    }

    let summary = StreamSummary {
        query_type: statement.query_type,
        t_last: statement.available_at.elapsed().as_millis() as i64,
        stats: tx.statistics(),
    };
    ctx.statement = None;
    Ok(StreamStep::Exhausted(summary))
}
