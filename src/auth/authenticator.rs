//! Email/password login.

use std::time::Duration;
use tracing::{error, warn};

use super::errors::AuthError;
use super::password::{DUMMY_PASSWORD_HASH, verify_password_async};
use super::state::{HasAuthBackend, with_deadline};
use crate::db::{User, UserRepository};
use crate::jwt::TokenPair;

/// Hash to verify the submitted password against. Unknown emails use
/// [`DUMMY_PASSWORD_HASH`] so the response time does not reveal them.
fn hash_to_verify(user: Option<&User>) -> &str {
    user.map_or(DUMMY_PASSWORD_HASH, |u| u.password.as_str())
}

/// Look up a user by email and check their password.
///
/// Every failure is reported as `Unauthorized` so callers cannot tell an
/// unknown email from a wrong password.
pub async fn check_credentials(
    users: &dyn UserRepository,
    timeout: Duration,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let user = with_deadline(timeout, users.get_by_email(email))
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to look up user by email");
            AuthError::Unauthorized
        })?;

    let verified = verify_password_async(
        password.to_string(),
        hash_to_verify(user.as_ref()).to_string(),
    )
    .await;

    let Some(user) = user else {
        warn!("Login attempt for unknown email");
        return Err(AuthError::Unauthorized);
    };

    let matches = verified.map_err(|e| {
        error!(user_id = %user.id, error = %e, "Password verification failed");
        AuthError::Unauthorized
    })?;

    if !matches {
        warn!(user_id = %user.id, "Login attempt with wrong password");
        return Err(AuthError::Unauthorized);
    }

    Ok(user)
}

/// Check credentials and issue a fresh token pair.
pub async fn authenticate<S>(state: &S, email: &str, password: &str) -> Result<TokenPair, AuthError>
where
    S: HasAuthBackend + ?Sized,
{
    let user = check_credentials(state.users(), state.store_timeout(), email, password).await?;

    state.jwt().generate_token_pair(&user).map_err(|e| {
        error!(user_id = %user.id, error = %e, "Failed to generate token pair");
        AuthError::Unauthorized
    })
}
