//! Capability trait over the user table.

use async_trait::async_trait;

use super::user::{NewUser, User, UserUpdate};

/// Errors returned by user repositories.
#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    /// Another user already has this email address
    DuplicateEmail,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::DuplicateEmail => write!(f, "Email address is already registered"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return StoreError::DuplicateEmail;
            }
        }
        StoreError::Database(e)
    }
}

/// Read and write access to users.
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users ordered by last name.
    async fn all(&self) -> Result<Vec<User>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user and return its id.
    async fn insert(&self, user: NewUser) -> Result<i64, StoreError>;

    /// Update identity fields and the admin flag. Returns false if no such user.
    async fn update(&self, user: &UserUpdate) -> Result<bool, StoreError>;

    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Replace the stored password hash. Returns false if no such user.
    async fn reset_password(&self, id: i64, password_hash: &str) -> Result<bool, StoreError>;
}
