//! READY: authenticated and idle.

use std::time::Instant;

use tracing::{debug, warn};

use crate::bolt::error::{BoltError, Status};
use crate::bolt::message::{BeginMessage, BoltRequest, RunMessage, SuccessMessage};
use crate::bolt::value::BoltValue;

use super::Outcome;
use crate::fsm::context::ConnectionContext;
use crate::fsm::response::Terminal;
use crate::fsm::spi::{TransactionKind, TransactionRequest};
use crate::fsm::state::State;

pub(super) fn process(request: BoltRequest, ctx: &mut ConnectionContext) -> Outcome {
    match request {
        BoltRequest::Run(run) => run_auto_commit(run, ctx),
        BoltRequest::Begin(begin) => begin_transaction(begin, ctx),
        BoltRequest::Logoff => {
            ctx.logoff();
            Outcome::next(State::Authentication, Terminal::success())
        }
        BoltRequest::Goodbye => Outcome::Close,
        other => Outcome::invalid(&other, State::Ready),
    }
}

/// Credentials-expired sessions may only run allowlisted queries.
pub(super) fn check_credentials(query: &str, ctx: &ConnectionContext) -> Result<(), BoltError> {
    if ctx.credentials_expired() && !ctx.config.is_allowed_when_expired(query) {
        return Err(BoltError::status(
            Status::SecurityCredentialsExpired,
            "The credentials you provided were valid, but must be changed before you can use this instance.",
        ));
    }
    Ok(())
}

/// Field metadata for RUN SUCCESS.
pub(super) fn run_success(fields: Vec<String>, started: Instant) -> SuccessMessage {
    let fields: Vec<BoltValue> = fields.into_iter().map(BoltValue::String).collect();
    SuccessMessage::new()
        .with("fields", fields)
        .with("t_first", started.elapsed().as_millis() as i64)
}

fn run_auto_commit(run: RunMessage, ctx: &mut ConnectionContext) -> Outcome {
    if let Err(e) = check_credentials(&run.query, ctx) {
        return Outcome::failed(&e);
    }

    let request = TransactionRequest {
        kind: TransactionKind::Implicit,
        principal: ctx.principal_name(),
        database: ctx.database_or_default(run.database()),
        bookmarks: run.bookmarks(),
        mode: run.mode(),
        timeout: run.tx_timeout(),
        metadata: run.tx_metadata(),
    };

    let started = Instant::now();
    let mut tx = match ctx.transactions.begin(request) {
        Ok(tx) => tx,
        Err(e) => return Outcome::failed(&e),
    };

    match tx.run(&run.query, &run.parameters) {
        Ok(metadata) => {
            debug!(
                "{}: auto-commit transaction {} opened on '{}'",
                ctx.connection_id,
                tx.id(),
                tx.database()
            );
            ctx.transaction = Some(tx);
            ctx.open_statement(metadata.query_type, None);
            Outcome::next(
                State::AutoCommit,
                Terminal::Success(run_success(metadata.fields, started)),
            )
        }
        Err(e) => {
            if let Err(rollback_error) = tx.rollback() {
                warn!(
                    "{}: rollback after failed RUN failed: {}",
                    ctx.connection_id, rollback_error
                );
            }
            Outcome::failed(&e)
        }
    }
}

fn begin_transaction(begin: BeginMessage, ctx: &mut ConnectionContext) -> Outcome {
    let request = TransactionRequest {
        kind: TransactionKind::Explicit,
        principal: ctx.principal_name(),
        database: ctx.database_or_default(begin.database.as_deref()),
        bookmarks: begin.bookmarks,
        mode: begin.mode,
        timeout: begin.tx_timeout,
        metadata: begin.tx_metadata,
    };

    match ctx.transactions.begin(request) {
        Ok(tx) => {
            debug!(
                "{}: explicit transaction {} opened on '{}'",
                ctx.connection_id,
                tx.id(),
                tx.database()
            );
            ctx.transaction = Some(tx);
            ctx.statement = None;
            ctx.next_qid = 0;
            Outcome::next(State::InTransaction, Terminal::success())
        }
        Err(e) => Outcome::failed(&e),
    }
}
