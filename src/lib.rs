pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod rate_limit;
pub mod web;

use api::{ApiState, create_api_router};
use auth::IpExtractor;
use axum::Router;
use db::UserRepository;
use jwt::JwtConfig;
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use web::{SessionStore, WebState, create_web_router};

pub struct ServerConfig {
    /// User repository shared by every handler
    pub users: Arc<dyn UserRepository>,
    /// Token codec, already validated
    pub jwt: Arc<JwtConfig>,
    /// Login attempts allowed per IP before throttling
    pub login_burst: u32,
    /// Deadline for a single user store call
    pub store_timeout: Duration,
    /// Proxy header carrying the client IP, if behind a trusted proxy
    pub ip_extractor: Option<IpExtractor>,
}

pub struct WebConfig {
    pub users: Arc<dyn UserRepository>,
    pub sessions: SessionStore,
    pub login_burst: u32,
    pub store_timeout: Duration,
    pub ip_extractor: Option<IpExtractor>,
}

/// Create the API application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let state = ApiState {
        users: config.users.clone(),
        jwt: config.jwt.clone(),
        store_timeout: config.store_timeout,
        rate_limit: Arc::new(
            RateLimitConfig::new(config.login_burst).with_ip_extractor(config.ip_extractor),
        ),
    };

    create_api_router(state)
}

/// Create the web application router with the given configuration.
pub fn create_web_app(config: &WebConfig) -> Router {
    let state = WebState {
        users: config.users.clone(),
        sessions: config.sessions.clone(),
        store_timeout: config.store_timeout,
        rate_limit: Arc::new(
            RateLimitConfig::new(config.login_burst).with_ip_extractor(config.ip_extractor),
        ),
    };

    create_web_router(state)
}

/// Prune expired sessions now and spawn the background scheduler.
/// Call this before starting the web server.
pub async fn init_cleanup(sessions: &SessionStore) {
    cleanup::run_cleanup(sessions).await;
    cleanup::spawn_cleanup_scheduler(sessions.clone());
}

/// Run a router on the given listener. This function blocks until the server exits.
pub async fn serve(app: Router, listener: TcpListener) -> Result<(), std::io::Error> {
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Run the API server on the given listener.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    serve(create_app(&config), listener).await
}

/// Run the web server on the given listener.
/// Call `init_cleanup` before this to prune sessions on startup.
pub async fn run_web_server(config: WebConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    serve(create_web_app(&config), listener).await
}
