//! Rate limiting for the login endpoint.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password
//! guessing. Requests whose client IP cannot be determined share one bucket.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};
use tracing::warn;

use crate::auth::{HasHeadersAndExtensions, IpExtractor, extract_client_ip};

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Default burst of login attempts per IP.
pub const DEFAULT_LOGIN_BURST: u32 = 5;

const UNKNOWN_CLIENT: &str = "unknown";

/// Rate limiting configuration for authentication endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Login attempts: one per second per IP, after an initial burst
    pub login: Arc<IpLimiter>,
    /// Proxy header to key on. `None` keys on the socket address
    pub ip_extractor: Option<IpExtractor>,
}

impl RateLimitConfig {
    pub fn new(login_burst: u32) -> Self {
        let burst = NonZeroU32::new(login_burst).unwrap_or(NonZeroU32::MIN);
        Self {
            login: Arc::new(RateLimiter::keyed(
                Quota::per_second(NonZeroU32::MIN).allow_burst(burst),
            )),
            ip_extractor: None,
        }
    }

    /// Trust `extractor` for the client address instead of the socket.
    pub fn with_ip_extractor(mut self, extractor: Option<IpExtractor>) -> Self {
        self.ip_extractor = extractor;
        self
    }

    /// Key for the request's client, `"unknown"` when none can be found.
    pub fn client_key<T: HasHeadersAndExtensions>(&self, source: &T) -> String {
        extract_client_ip(source, self.ip_extractor).unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_BURST)
    }
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = config.client_key(&request);

    match config.login.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            warn!(ip = %ip, "Login rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many authentication attempts. Please wait before trying again.",
            )
                .into_response()
        }
    }
}
