//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::jwt::TokenError;

/// Errors produced by login, refresh and bearer-header checks.
#[derive(Debug)]
pub enum AuthError {
    /// Bad credentials or any failure during login. Deliberately vague.
    Unauthorized,
    ExpiredToken,
    MalformedToken,
    InvalidIssuer,
    MissingHeader,
    MalformedHeader,
    NotBearerScheme,
    /// The refresh token failed verification; carries the reason.
    BadRefreshToken(TokenError),
    /// The token subject is not a user id.
    InvalidSubject,
    /// The token's user no longer exists.
    UnknownUser,
    /// The refresh token is not close enough to expiry.
    TooEarly,
    /// The user store failed or did not answer in time.
    StoreUnavailable,
    Internal,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized
            | AuthError::ExpiredToken
            | AuthError::MalformedToken
            | AuthError::InvalidIssuer
            | AuthError::MissingHeader
            | AuthError::MalformedHeader
            | AuthError::NotBearerScheme => StatusCode::UNAUTHORIZED,
            AuthError::BadRefreshToken(_) | AuthError::InvalidSubject | AuthError::UnknownUser => {
                StatusCode::BAD_REQUEST
            }
            AuthError::TooEarly => too_early(),
            AuthError::StoreUnavailable | AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AuthError::Unauthorized => "unauthorized".into(),
            AuthError::ExpiredToken => "expired token".into(),
            AuthError::MalformedToken => "malformed token".into(),
            AuthError::InvalidIssuer => "invalid issuer".into(),
            AuthError::MissingHeader => "missing Authorization header".into(),
            AuthError::MalformedHeader => "invalid Authorization header".into(),
            AuthError::NotBearerScheme => "unauthorized header: no Bearer found".into(),
            AuthError::BadRefreshToken(reason) => reason.to_string(),
            AuthError::InvalidSubject => "invalid token subject".into(),
            AuthError::UnknownUser => "unknown user".into(),
            AuthError::TooEarly => "refresh token does not need renewed yet".into(),
            AuthError::StoreUnavailable => "user store unavailable".into(),
            AuthError::Internal => "internal error".into(),
        }
    }
}

/// 425 Too Early.
fn too_early() -> StatusCode {
    StatusCode::from_u16(425).unwrap_or(StatusCode::BAD_REQUEST)
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for AuthError {}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::Malformed(_) => AuthError::MalformedToken,
            TokenError::InvalidIssuer => AuthError::InvalidIssuer,
            TokenError::Signing(_) | TokenError::InvalidLifetimes | TokenError::TimeError => {
                AuthError::Internal
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
