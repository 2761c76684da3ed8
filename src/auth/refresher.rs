//! Refresh-token rotation.

use std::time::Duration;
use tracing::{error, warn};

use super::cookie::refresh_cookie;
use super::errors::AuthError;
use super::state::{HasAuthBackend, with_deadline};
use crate::jwt::{TokenPair, unix_now};

/// A refresh is only honoured when the token has at most this long to live.
pub const REFRESH_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// New tokens plus the `Set-Cookie` value carrying the new refresh token.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub tokens: TokenPair,
    pub cookie: String,
}

/// Exchange a refresh token that is about to expire for a new pair.
///
/// The token is verified from scratch on every call.
pub async fn refresh<S>(state: &S, refresh_token: &str) -> Result<RefreshOutcome, AuthError>
where
    S: HasAuthBackend + ?Sized,
{
    let now = unix_now().map_err(|_| AuthError::Internal)?;
    refresh_at(state, refresh_token, now).await
}

/// [`refresh`] with the renewal window measured from `now` (Unix seconds).
pub(crate) async fn refresh_at<S>(
    state: &S,
    refresh_token: &str,
    now: u64,
) -> Result<RefreshOutcome, AuthError>
where
    S: HasAuthBackend + ?Sized,
{
    let claims = state.jwt().verify(refresh_token).map_err(|e| {
        warn!(reason = %e, "Rejected refresh token");
        AuthError::BadRefreshToken(e)
    })?;

    let remaining = claims.exp as i64 - now as i64;
    if remaining > REFRESH_GRACE_PERIOD.as_secs() as i64 {
        return Err(AuthError::TooEarly);
    }

    let user_id: i64 = claims.sub.parse().map_err(|_| AuthError::InvalidSubject)?;

    let user = with_deadline(state.store_timeout(), state.users().get_by_id(user_id))
        .await
        .map_err(|e| {
            error!(user_id = %user_id, error = %e, "Failed to look up user for refresh");
            AuthError::StoreUnavailable
        })?
        .ok_or(AuthError::UnknownUser)?;

    let tokens = state.jwt().generate_token_pair(&user).map_err(|e| {
        error!(user_id = %user.id, error = %e, "Failed to generate token pair");
        AuthError::Internal
    })?;

    let cookie = refresh_cookie(&tokens.refresh_token, state.jwt().refresh_ttl());

    Ok(RefreshOutcome { tokens, cookie })
}
