//! Client IP extraction utilities.

use std::net::{IpAddr, SocketAddr};

use axum::{extract::ConnectInfo, http::request::Parts};

/// Trait for types that provide access to HTTP headers and extensions.
/// Implemented for both `Parts` and `Request` to allow flexible IP extraction.
pub trait HasHeadersAndExtensions {
    fn headers(&self) -> &axum::http::HeaderMap;
    fn extensions(&self) -> &axum::http::Extensions;
}

impl HasHeadersAndExtensions for Parts {
    fn headers(&self) -> &axum::http::HeaderMap {
        &self.headers
    }
    fn extensions(&self) -> &axum::http::Extensions {
        &self.extensions
    }
}

impl<B> HasHeadersAndExtensions for axum::extract::Request<B> {
    fn headers(&self) -> &axum::http::HeaderMap {
        axum::extract::Request::headers(self)
    }
    fn extensions(&self) -> &axum::http::Extensions {
        axum::extract::Request::extensions(self)
    }
}

/// Proxy header to read the client IP from. Only set this when the server
/// sits behind a reverse proxy that overwrites the header.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpExtractor {
    /// First entry of `X-Forwarded-For`
    XForwardedFor,
    /// `X-Real-IP`
    XRealIp,
}

impl IpExtractor {
    pub fn header_name(&self) -> &'static str {
        match self {
            IpExtractor::XForwardedFor => "x-forwarded-for",
            IpExtractor::XRealIp => "x-real-ip",
        }
    }

    /// Parse the header value into a normalized IP address.
    pub fn extract(&self, header_value: &str) -> Option<String> {
        let candidate = match self {
            IpExtractor::XForwardedFor => header_value.split(',').next()?,
            IpExtractor::XRealIp => header_value,
        };
        candidate
            .trim()
            .parse::<IpAddr>()
            .ok()
            .map(|ip| ip.to_string())
    }
}

/// Extract the client IP address.
///
/// If `ip_extractor` is set, the IP comes from the configured header only and
/// a missing or unparseable header yields `None` (no fallback to the socket,
/// which would be the proxy's address).
///
/// If `ip_extractor` is None, uses the SocketAddr from ConnectInfo. Forwarding
/// headers are ignored since the client controls them.
pub fn extract_client_ip<T: HasHeadersAndExtensions>(
    source: &T,
    ip_extractor: Option<IpExtractor>,
) -> Option<String> {
    match ip_extractor {
        Some(extractor) => source
            .headers()
            .get(extractor.header_name())
            .and_then(|value| value.to_str().ok())
            .and_then(|value| extractor.extract(value)),
        None => source
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string()),
    }
}
