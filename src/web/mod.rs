//! Session-based web frontend sharing the user repository with the API.

mod handlers;
mod session;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;

use crate::db::UserRepository;
use crate::rate_limit::{RateLimitConfig, rate_limit_login};

pub use session::{
    SESSION_COOKIE_NAME, SESSION_LIFETIME, Session, SessionStore, clear_session_cookie,
    session_cookie,
};

/// Client address of the current request, always present in extensions
/// once [`add_ip_to_context`] has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

#[derive(Clone)]
pub struct WebState {
    pub users: Arc<dyn UserRepository>,
    pub sessions: SessionStore,
    pub store_timeout: Duration,
    pub rate_limit: Arc<RateLimitConfig>,
}

/// Create the web router.
pub fn create_web_router(state: WebState) -> Router {
    let rate_limit = state.rate_limit.clone();
    let login_router = Router::new()
        .route("/login", post(handlers::login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit.clone(),
            rate_limit_login,
        ));

    Router::new()
        .route("/", get(handlers::home))
        .route("/logout", post(handlers::logout))
        .route("/user/profile", get(handlers::profile))
        .with_state(state)
        .merge(login_router)
        .layer(middleware::from_fn_with_state(
            rate_limit,
            add_ip_to_context,
        ))
}

/// Middleware recording the client IP as [`ClientIp`].
///
/// Uses the same client key as the login limiter, so the socket address
/// unless a proxy header was configured.
pub async fn add_ip_to_context(
    State(config): State<Arc<RateLimitConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    let ip = config.client_key(&request);
    request.extensions_mut().insert(ClientIp(ip));
    next.run(request).await
}

