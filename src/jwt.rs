//! JWT token generation and validation.
//!
//! Access tokens carry the user's display name and admin flag and live for a
//! short time. Refresh tokens carry only the subject and issuer and live
//! longer. Both are HMAC-signed with the same process-wide secret.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::db::User;

/// Default access token lifetime: 15 minutes
pub const ACCESS_TOKEN_DURATION: Duration = Duration::from_secs(15 * 60);

/// Default refresh token lifetime: 24 hours
pub const REFRESH_TOKEN_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Algorithm used when signing. Verification accepts the whole HMAC family.
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Claims carried by both token kinds.
///
/// Refresh tokens leave `name`, `aud` and `admin` unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id, stringified)
    pub sub: String,
    /// Display name ("first last")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issuer (configured domain)
    #[serde(default)]
    pub iss: String,
    /// Audience (configured domain)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Admin flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Lifetimes and issuer for the codec. Fixed once the codec is built.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// Issuer and audience of every token.
    pub domain: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            access_ttl: ACCESS_TOKEN_DURATION,
            refresh_ttl: REFRESH_TOKEN_DURATION,
        }
    }

    pub fn with_lifetimes(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }
}

/// Signing and verification keys plus token settings.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    settings: TokenSettings,
}

impl JwtConfig {
    /// Create a codec for the given secret.
    /// Fails if the refresh lifetime does not exceed the access lifetime.
    pub fn new(secret: &[u8], settings: TokenSettings) -> Result<Self, TokenError> {
        if settings.refresh_ttl <= settings.access_ttl {
            return Err(TokenError::InvalidLifetimes);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            settings,
        })
    }

    pub fn domain(&self) -> &str {
        &self.settings.domain
    }

    pub fn access_ttl(&self) -> Duration {
        self.settings.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.settings.refresh_ttl
    }

    /// The algorithm every issued token is signed with.
    pub fn algorithm(&self) -> Algorithm {
        SIGNING_ALGORITHM
    }

    /// Generate a short-lived access token for a user.
    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        let now = unix_now()?;

        let claims = Claims {
            sub: user.id.to_string(),
            name: Some(format!("{} {}", user.first_name, user.last_name)),
            iss: self.settings.domain.clone(),
            aud: Some(self.settings.domain.clone()),
            admin: Some(user.is_admin),
            iat: now,
            exp: now + self.settings.access_ttl.as_secs(),
        };

        self.sign(&claims)
    }

    /// Generate a refresh token. Carries nothing beyond subject, issuer and times.
    pub fn issue_refresh_token(&self, user: &User) -> Result<String, TokenError> {
        let now = unix_now()?;

        let claims = Claims {
            sub: user.id.to_string(),
            name: None,
            iss: self.settings.domain.clone(),
            aud: None,
            admin: None,
            iat: now,
            exp: now + self.settings.refresh_ttl.as_secs(),
        };

        self.sign(&claims)
    }

    /// Issue both tokens for a user.
    pub fn generate_token_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user)?,
            refresh_token: self.issue_refresh_token(user)?,
        })
    }

    /// Check the signature, expiry and issuer of a token and return its claims.
    ///
    /// The accepted algorithms are pinned to the HMAC family; the `alg` header
    /// of the token is never trusted on its own.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_aud = false;

        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e),
            })?;

        if token_data.claims.iss != self.settings.domain {
            return Err(TokenError::InvalidIssuer);
        }

        Ok(token_data.claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }
}

/// Current time as Unix seconds.
pub fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::TimeError)
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum TokenError {
    /// Error encoding the token
    Signing(jsonwebtoken::errors::Error),
    /// The token's expiry is in the past
    Expired,
    /// Bad signature, wrong algorithm, or unparseable token
    Malformed(jsonwebtoken::errors::Error),
    /// Token was not issued by this domain
    InvalidIssuer,
    /// Refresh lifetime must exceed access lifetime
    InvalidLifetimes,
    /// System time error
    TimeError,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Signing(e) => write!(f, "Failed to sign token: {}", e),
            TokenError::Expired => write!(f, "expired token"),
            TokenError::Malformed(e) => write!(f, "malformed token: {}", e),
            TokenError::InvalidIssuer => write!(f, "invalid issuer"),
            TokenError::InvalidLifetimes => {
                write!(f, "refresh token lifetime must exceed access token lifetime")
            }
            TokenError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for TokenError {}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-testing-only";

    fn config() -> JwtConfig {
        JwtConfig::new(SECRET, TokenSettings::new("example.com")).unwrap()
    }

    fn user() -> User {
        User {
            id: 7,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: String::new(),
            is_admin: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn encode_raw(claims: &Claims, alg: Algorithm, secret: &[u8]) -> String {
        jsonwebtoken::encode(&Header::new(alg), claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn test_access_token_round_trip() {
        let config = config();
        let token = config.issue_access_token(&user()).unwrap();

        let claims = config.verify(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.iss, "example.com");
        assert_eq!(claims.aud.as_deref(), Some("example.com"));
        assert_eq!(claims.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(claims.admin, Some(true));
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_DURATION.as_secs());
    }

    #[test]
    fn test_refresh_token_is_minimal() {
        let config = config();
        let token = config.issue_refresh_token(&user()).unwrap();

        let claims = config.verify(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.iss, "example.com");
        assert!(claims.name.is_none());
        assert!(claims.aud.is_none());
        assert!(claims.admin.is_none());
    }

    #[test]
    fn test_refresh_outlives_access() {
        let config = config();
        let pair = config.generate_token_pair(&user()).unwrap();

        let access = config.verify(&pair.access_token).unwrap();
        let refresh = config.verify(&pair.refresh_token).unwrap();
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_lifetimes_must_be_ordered() {
        let settings = TokenSettings::new("example.com")
            .with_lifetimes(Duration::from_secs(60), Duration::from_secs(60));
        assert!(matches!(
            JwtConfig::new(SECRET, settings),
            Err(TokenError::InvalidLifetimes)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtConfig::new(b"another-secret", TokenSettings::new("example.com")).unwrap();
        let token = other.issue_access_token(&user()).unwrap();

        assert!(matches!(config().verify(&token), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            config().verify("not-a-token"),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let now = unix_now().unwrap();
        let claims = Claims {
            sub: "7".to_string(),
            name: None,
            iss: "example.com".to_string(),
            aud: None,
            admin: None,
            iat: now - 100,
            exp: now - 50,
        };
        let token = encode_raw(&claims, Algorithm::HS256, SECRET);

        assert!(matches!(config().verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let other = JwtConfig::new(SECRET, TokenSettings::new("evil.example")).unwrap();
        let token = other.issue_access_token(&user()).unwrap();

        assert!(matches!(
            config().verify(&token),
            Err(TokenError::InvalidIssuer)
        ));
    }

    #[test]
    fn test_other_hmac_variant_accepted() {
        let now = unix_now().unwrap();
        let claims = Claims {
            sub: "7".to_string(),
            name: None,
            iss: "example.com".to_string(),
            aud: None,
            admin: None,
            iat: now,
            exp: now + 60,
        };
        let token = encode_raw(&claims, Algorithm::HS512, SECRET);

        assert_eq!(config().verify(&token).unwrap().sub, "7");
    }

    #[test]
    fn test_unsigned_token_rejected() {
        // {"alg":"none","typ":"JWT"} with a valid payload and no signature
        let header = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";
        let payload = "eyJzdWIiOiI3IiwiaXNzIjoiZXhhbXBsZS5jb20iLCJleHAiOjk5OTk5OTk5OTl9";
        let token = format!("{}.{}.", header, payload);

        assert!(matches!(
            config().verify(&token),
            Err(TokenError::Malformed(_))
        ));
    }
}
