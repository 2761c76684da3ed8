//! Token-pair authentication.
//!
//! Login issues a short-lived access token and a longer-lived refresh token.
//! Access tokens are presented as `Authorization: Bearer` headers; refresh
//! tokens are exchanged for a new pair only when close to expiry, and the new
//! refresh token is also delivered as a host-only cookie.

mod authenticator;
mod bearer;
mod cookie;
mod errors;
mod ip;
pub mod password;
mod refresher;
mod state;

pub use authenticator::{authenticate, check_credentials};
pub use bearer::{BearerAuth, extract_bearer, require_bearer};
pub use cookie::{REFRESH_COOKIE_NAME, get_cookie, refresh_cookie};
pub use errors::AuthError;
pub use ip::{HasHeadersAndExtensions, IpExtractor, extract_client_ip};
pub use refresher::{REFRESH_GRACE_PERIOD, RefreshOutcome, refresh};
pub use state::{DEFAULT_STORE_TIMEOUT, HasAuthBackend, StoreCallError, with_deadline};

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::time::Duration;

    use super::password::hash_password;
    use crate::db::{MemoryUserRepository, NewUser, User, UserRepository};
    use crate::impl_has_auth_backend;
    use crate::jwt::{JwtConfig, TokenSettings};

    pub const SECRET: &[u8] = b"unit-test-secret-that-is-long-enough";

    #[derive(Clone)]
    pub struct TestState {
        pub jwt: Arc<JwtConfig>,
        pub users: Arc<dyn UserRepository>,
        pub store_timeout: Duration,
    }

    impl_has_auth_backend!(TestState);

    pub fn test_user(id: i64) -> User {
        User {
            id,
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            email: "admin@example.com".to_string(),
            password: String::new(),
            is_admin: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    /// State with one user, admin@example.com / "secret". Returns its id.
    pub async fn seeded_state(settings: TokenSettings) -> (TestState, i64) {
        let users = MemoryUserRepository::new();
        let id = users
            .insert(NewUser {
                first_name: "Admin".to_string(),
                last_name: "User".to_string(),
                email: "admin@example.com".to_string(),
                password_hash: hash_password("secret").unwrap(),
                is_admin: true,
            })
            .await
            .unwrap();

        let state = TestState {
            jwt: Arc::new(JwtConfig::new(SECRET, settings).unwrap()),
            users: Arc::new(users),
            store_timeout: Duration::from_secs(1),
        };
        (state, id)
    }
}
