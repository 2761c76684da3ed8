//! Cookie helpers for refresh-token delivery and session lookup.

use axum::http::header;
use chrono::{TimeDelta, Utc};
use std::time::Duration;

/// Cookie carrying the rotated refresh token. The `__Host-` prefix requires
/// `Secure`, `Path=/` and no `Domain`, which pins it to the serving host.
pub const REFRESH_COOKIE_NAME: &str = "__Host-refresh-token";

/// Build the `Set-Cookie` value for a refresh token valid for `ttl`.
pub fn refresh_cookie(token: &str, ttl: Duration) -> String {
    let secs = ttl.as_secs();
    let expires = Utc::now() + TimeDelta::seconds(secs as i64);
    format!(
        "{}={}; Path=/; Expires={}; Max-Age={}; HttpOnly; Secure; SameSite=Strict",
        REFRESH_COOKIE_NAME,
        token,
        expires.format("%a, %d %b %Y %H:%M:%S GMT"),
        secs
    )
}

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}
