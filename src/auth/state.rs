//! Authentication state traits and macro.

use std::future::Future;
use std::time::Duration;

use crate::db::{StoreError, UserRepository};
use crate::jwt::JwtConfig;

/// Default deadline for a single user store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait for state types that provide the token codec and user store.
pub trait HasAuthBackend {
    fn jwt(&self) -> &JwtConfig;
    fn users(&self) -> &dyn UserRepository;
    fn store_timeout(&self) -> Duration;
}

/// Why a bounded store call failed.
#[derive(Debug)]
pub enum StoreCallError {
    Store(StoreError),
    TimedOut,
}

impl std::fmt::Display for StoreCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreCallError::Store(e) => write!(f, "{}", e),
            StoreCallError::TimedOut => write!(f, "user store call timed out"),
        }
    }
}

/// Run a store call under the state's deadline.
pub async fn with_deadline<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreCallError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(StoreCallError::Store),
        Err(_) => Err(StoreCallError::TimedOut),
    }
}

/// Macro to implement `HasAuthBackend` for state structs with the standard fields.
///
/// The struct must have these fields:
/// - `jwt: Arc<JwtConfig>`
/// - `users: Arc<dyn UserRepository>`
/// - `store_timeout: Duration`
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub jwt: Arc<JwtConfig>,
///     pub users: Arc<dyn UserRepository>,
///     pub store_timeout: Duration,
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn jwt(&self) -> &$crate::jwt::JwtConfig {
                &self.jwt
            }
            fn users(&self) -> &dyn $crate::db::UserRepository {
                self.users.as_ref()
            }
            fn store_timeout(&self) -> std::time::Duration {
                self.store_timeout
            }
        }
    };
}
