//! `Authorization: Bearer <token>` handling for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::errors::AuthError;
use super::state::HasAuthBackend;
use crate::jwt::{Claims, JwtConfig};

/// A verified bearer token and its claims.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    pub token: String,
    pub claims: Claims,
}

impl BearerAuth {
    /// The authenticated user's id.
    pub fn user_id(&self) -> Option<i64> {
        self.claims.sub.parse().ok()
    }

    pub fn is_admin(&self) -> bool {
        self.claims.admin.unwrap_or(false)
    }
}

/// Parse the Authorization header and verify the bearer token.
pub fn extract_bearer(headers: &HeaderMap, jwt: &JwtConfig) -> Result<(String, Claims), AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    if value.is_empty() {
        return Err(AuthError::MissingHeader);
    }

    let parts: Vec<&str> = value.split(' ').collect();
    if parts.len() != 2 {
        return Err(AuthError::MalformedHeader);
    }

    if parts[0] != "Bearer" {
        return Err(AuthError::NotBearerScheme);
    }

    let token = parts[1];
    let claims = jwt.verify(token)?;

    let token_header = jsonwebtoken::decode_header(token).map_err(|_| AuthError::MalformedToken)?;
    if token_header.alg != jwt.algorithm() {
        return Err(AuthError::MalformedToken);
    }

    Ok((token.to_string(), claims))
}

/// Middleware guarding protected routes.
///
/// Verified claims are stored in request extensions as [`BearerAuth`]. Every
/// response, including rejections, gets `Vary: Authorization`.
pub async fn require_bearer<S>(State(state): State<S>, mut request: Request, next: Next) -> Response
where
    S: HasAuthBackend + Clone + Send + Sync + 'static,
{
    let mut response = match extract_bearer(request.headers(), state.jwt()) {
        Ok((token, claims)) => {
            request.extensions_mut().insert(BearerAuth { token, claims });
            next.run(request).await
        }
        Err(e) => {
            debug!(reason = %e, "Rejected bearer token");
            e.into_response()
        }
    };

    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

impl<S> FromRequestParts<S> for BearerAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<BearerAuth>() {
            return Ok(auth.clone());
        }

        let (token, claims) = extract_bearer(&parts.headers, state.jwt())?;
        Ok(BearerAuth { token, claims })
    }
}
