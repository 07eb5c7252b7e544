//! Security headers middleware.
//!
//! The API serves JSON and avatar images to a single-page client on another
//! origin, so the policy is locked down except for cross-origin resource
//! loading.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::services::avatars::AVATAR_PREFIX;

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: no-referrer`
/// - `Content-Security-Policy: default-src 'none'; frame-ancestors 'none'`
/// - `Cross-Origin-Opener-Policy: same-origin`
/// - `Cross-Origin-Resource-Policy: cross-origin` (the client loads avatars)
/// - `Cache-Control: no-store` on everything except avatar images
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let cacheable = request
        .uri()
        .path()
        .strip_prefix('/')
        .is_some_and(|path| path.starts_with(AVATAR_PREFIX));

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    // Nothing served here is a document.
    headers.insert(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("cross-origin"),
    );

    if cacheable {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400"));
    } else {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/products", get(|| async { "[]" }))
            .route("/avatars/fox.png", get(|| async { "png" }))
            .layer(axum::middleware::from_fn(security_headers_middleware))
    }

    async fn headers_for(uri: &str) -> axum::http::HeaderMap {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .headers()
            .clone()
    }

    #[tokio::test]
    async fn test_api_responses_are_locked_down() {
        let headers = headers_for("/products").await;

        assert_eq!(headers[X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[CACHE_CONTROL], "no-store, max-age=0");
        assert_eq!(headers["cross-origin-resource-policy"], "cross-origin");
    }

    #[tokio::test]
    async fn test_avatars_are_cacheable() {
        let headers = headers_for("/avatars/fox.png").await;
        assert_eq!(headers[CACHE_CONTROL], "public, max-age=86400");
    }
}
