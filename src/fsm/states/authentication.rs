//! AUTHENTICATION: waiting for LOGON.

use tracing::{debug, warn};

use crate::bolt::error::Status;
use crate::bolt::message::{AuthToken, BoltRequest, FailureMessage, SuccessMessage};

use super::Outcome;
use crate::fsm::context::{ConnectionContext, Principal};
use crate::fsm::response::Terminal;
use crate::fsm::spi::AuthVerdict;
use crate::fsm::state::State;

pub(super) fn process(request: BoltRequest, ctx: &mut ConnectionContext) -> Outcome {
    match request {
        BoltRequest::Logon(logon) => match authenticate(&logon.auth, ctx) {
            Ok(expired) => {
                let mut success = SuccessMessage::new();
                if expired {
                    success.add("credentials_expired", true);
                }
                Outcome::next(State::Ready, Terminal::Success(success))
            }
            Err(failure) => Outcome::Fatal(failure),
        },
        BoltRequest::Goodbye => Outcome::Close,
        other => Outcome::invalid(&other, State::Authentication),
    }
}

/// Verify `token` and log the principal in.
///
/// Returns whether the credentials are expired, or the failure that must
/// kill the connection.
pub(super) fn authenticate(
    token: &AuthToken,
    ctx: &mut ConnectionContext,
) -> Result<bool, FailureMessage> {
    let verdict = ctx.authentication.verify(token).map_err(|e| {
        warn!("{}: authentication provider failed: {}", ctx.connection_id, e);
        e.to_failure()
    })?;

    let (name, expired) = match verdict {
        AuthVerdict::Authenticated(name) => (name, false),
        AuthVerdict::CredentialsExpired(name) => (name, true),
        AuthVerdict::Unauthorized(reason) => {
            warn!(
                "{}: authentication failed for scheme '{}': {}",
                ctx.connection_id, token.scheme, reason
            );
            return Err(FailureMessage::new(Status::SecurityUnauthorized, &reason));
        }
    };

    debug!(
        "{}: authenticated '{}' (credentials expired: {})",
        ctx.connection_id, name, expired
    );
    ctx.login(Principal::new(name, expired));
    Ok(expired)
}
