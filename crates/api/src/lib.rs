//! Shopfront REST API library.
//!
//! JSON API behind the storefront's single-page client: bearer-token
//! authentication, the product catalog, per-user carts, profiles and the
//! admin dashboard. The binary in `main.rs` only loads configuration and
//! serves [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use middleware::request_id::REQUEST_ID_HEADER;
use state::AppState;

/// CORS policy admitting only the configured client origin.
///
/// Without an origin no `Access-Control-Allow-Origin` header is ever sent.
fn cors_layer(client_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([REQUEST_ID_HEADER.clone()])
        .max_age(Duration::from_secs(60 * 60));

    match client_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(AllowOrigin::list([origin])),
        Some(Err(_)) => {
            tracing::warn!("Ignoring client origin that is not a valid header value");
            layer
        }
        None => layer,
    }
}

/// Build the full application: routes plus the middleware stack described
/// in [`middleware`].
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config().client_origin.as_deref());

    routes::routes(&state)
        .with_state(state)
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::tests::test_config;

    fn test_app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/shopfront_test")
            .unwrap();
        app(AppState::new(test_config(), pool))
    }

    #[tokio::test]
    async fn test_stack_sets_request_id_and_security_headers() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    }

    #[tokio::test]
    async fn test_cors_preflight_for_client_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/products")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_other_origins() {
        let request = Request::builder()
            .uri("/health")
            .header("origin", "https://evil.example")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();

        assert!(!response.headers().contains_key("access-control-allow-origin"));
    }
}
