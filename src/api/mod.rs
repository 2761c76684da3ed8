mod auth;
mod error;
mod users;

use axum::{Json, Router, routing::get};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::db::UserRepository;
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

pub use error::{ApiError, ResultExt};

/// Shared state for every API route.
#[derive(Clone)]
pub struct ApiState {
    pub users: Arc<dyn UserRepository>,
    pub jwt: Arc<JwtConfig>,
    pub store_timeout: Duration,
    pub rate_limit: Arc<RateLimitConfig>,
}

impl_has_auth_backend!(ApiState);

/// Create the API router.
///
/// `/auth`, `/refresh-token` and `/test` are public. Everything under
/// `/users` requires a bearer access token.
pub fn create_api_router(state: ApiState) -> Router {
    Router::new()
        .merge(auth::router(state.clone()))
        .route("/test", get(hello))
        .nest("/users", users::router(state))
        .fallback(not_found)
}

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

async fn hello() -> Json<Message> {
    Json(Message {
        message: "Hello World",
    })
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
