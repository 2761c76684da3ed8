//! Argon2id password hashing and verification.
//!
//! Hashes are stored as PHC strings so the parameters and salt travel with
//! the hash. Verification compares in constant time. Request handlers use the
//! `_async` variants, which run Argon2 on the blocking thread pool.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// Argon2id hash with the default parameters, checked against when a login
/// names an unknown email so both outcomes cost one verification.
pub const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dXNlcmh1YmR1bW15c2FsdA$/PFFi44d1yCrg8ZufeLofHztmFjwq1mKwnKx1psF7Io";

#[derive(Debug)]
pub enum PasswordError {
    Hash(argon2::password_hash::Error),
    /// The blocking task panicked or was cancelled.
    Task(tokio::task::JoinError),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordError::Hash(e) => write!(f, "password hash error: {}", e),
            PasswordError::Task(e) => write!(f, "password task failed: {}", e),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Hash a plaintext password with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a plaintext password against a stored PHC hash.
///
/// `Ok(false)` on mismatch; `Err` only when the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_async(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(PasswordError::Task)?
        .map_err(PasswordError::Hash)
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_async(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(PasswordError::Task)?
        .map_err(PasswordError::Hash)
}
