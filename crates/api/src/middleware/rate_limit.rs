//! Per-IP rate limiting for the credential endpoints (`/login`,
//! `/register`), using governor and `tower_governor`.
//!
//! Rejections are rendered as the usual JSON error envelope, keeping the
//! `retry-after` header set by the limiter.
//!
//! # Deployment
//!
//! The key prefers `X-Forwarded-For` and `X-Real-IP`, which any client can
//! set. Keying is only sound when the API sits behind a reverse proxy that
//! overwrites those headers; exposed directly, a client can pick a new key
//! per request.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response},
    response::IntoResponse,
};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

/// Key extractor using the client IP reported by a reverse proxy, falling
/// back to the TCP peer address.
///
/// Order: first `X-Forwarded-For` entry, `X-Real-IP`, then
/// `ConnectInfo<SocketAddr>`.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor;

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<IpAddr> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        header_ip(req, "x-forwarded-for")
            .or_else(|| header_ip(req, "x-real-ip"))
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Render a limiter rejection as a JSON error, keeping its headers.
fn rejection_response(err: GovernorError) -> Response<Body> {
    let headers = match &err {
        GovernorError::TooManyRequests { headers, .. } | GovernorError::Other { headers, .. } => {
            headers.clone()
        }
        GovernorError::UnableToExtractKey => None,
    };

    let mut response = AppError::from(err).into_response();
    if let Some(headers) = headers {
        response.headers_mut().extend(headers);
    }
    response
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for login and registration: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. `per_second(6)` and `burst_size(5)` are
/// non-zero, which is all `GovernorConfigBuilder::finish` checks.
#[must_use]
pub fn credentials_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config)).error_handler(rejection_response)
}
