//! CONNECTED and NEGOTIATION: waiting for HELLO.

use std::collections::HashMap;

use crate::bolt::message::{AuthToken, BoltRequest, HelloMessage, SuccessMessage};
use crate::bolt::value::BoltValue;

use super::authentication::authenticate;
use super::Outcome;
use crate::fsm::context::ConnectionContext;
use crate::fsm::response::Terminal;
use crate::fsm::state::State;

const UTC_PATCH: &str = "utc";
const RECV_TIMEOUT_HINT: &str = "connection.recv_timeout_seconds";

pub(super) fn process(state: State, request: BoltRequest, ctx: &mut ConnectionContext) -> Outcome {
    match request {
        BoltRequest::Hello(hello) => hello_received(hello, ctx),
        other => Outcome::invalid(&other, state),
    }
}

fn hello_received(hello: HelloMessage, ctx: &mut ConnectionContext) -> Outcome {
    let mut success = SuccessMessage::new()
        .with("server", ctx.config.server_agent.as_str())
        .with("connection_id", ctx.connection_id.as_str());

    if ctx.version.supports_hints() {
        if let Some(timeout) = ctx.config.connection_recv_timeout {
            let mut hints = HashMap::new();
            hints.insert(
                RECV_TIMEOUT_HINT.to_string(),
                BoltValue::Integer(i64::try_from(timeout).unwrap_or(i64::MAX)),
            );
            success.add("hints", hints);
        }
    }

    if ctx.version.supports_utc_patch() && hello.requests_patch(UTC_PATCH) {
        ctx.utc_patch = true;
        success.add("patch_bolt", vec![BoltValue::from(UTC_PATCH)]);
    }

    ctx.user_agent = Some(hello.user_agent);

    if ctx.version.supports_logon() {
        return Outcome::next(State::Authentication, Terminal::Success(success));
    }

    // Older protocol versions authenticate inline.
    let token = hello.auth.unwrap_or_else(AuthToken::none);
    match authenticate(&token, ctx) {
        Ok(expired) => {
            if expired {
                success.add("credentials_expired", true);
            }
            Outcome::next(State::Ready, Terminal::Success(success))
        }
        Err(failure) => Outcome::Fatal(failure),
    }
}
