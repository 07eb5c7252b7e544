//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database ping)
//!
//! # Session (rate limited)
//! POST /login                  - Password login, returns a bearer token
//! POST /register               - Create a `user` account, returns a bearer token
//!
//! # Avatars
//! GET  /avatars                - List preset avatars
//! GET  /avatars/{file}         - Avatar image
//!
//! # Gated (bearer token + role table)
//! GET    /products             - Product listing
//! POST   /products             - Create product (admin)
//! GET    /products/{id}        - Product detail
//! PUT    /products/{id}        - Replace product (admin)
//! DELETE /products/{id}        - Delete product (admin)
//! GET    /cart                 - Current user's cart
//! POST   /cart                 - Add product
//! PUT    /cart                 - Set quantity
//! DELETE /cart                 - Remove product
//! GET    /profile              - User dashboard
//! PUT    /profile/credentials  - Change name and email
//! PUT    /profile/password     - Change password
//! PUT    /profile/avatar       - Pick avatar
//! GET    /admin                - Admin dashboard
//! GET    /users                - List users (admin)
//! GET    /users/{id}           - User detail (admin)
//! DELETE /users/{id}           - Delete user and cart (admin)
//! ```

pub mod admin;
pub mod auth;
pub mod avatars;
pub mod cart;
pub mod health;
pub mod products;
pub mod profile;

use axum::{
    Json, Router,
    extract::{FromRequest, Request, rejection::JsonRejection},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;
use tower_http::services::ServeDir;

use crate::error::AppError;
use crate::middleware::{authenticate, credentials_rate_limiter, role_gate};
use crate::state::AppState;

// =============================================================================
// Response Envelope
// =============================================================================

/// Successful JSON response: `{"success": true, "message"?: ..., ...data}`.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(flatten)]
    data: T,
}

impl<T> Success<T> {
    /// Envelope without a message.
    pub const fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    /// Envelope with a message for the client to display.
    pub const fn with_message(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message: Some(message),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// =============================================================================
// Request Body Extractor
// =============================================================================

/// `Json` extractor whose rejection uses the API error envelope.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");
                Err(AppError::BadRequest("Invalid request body".to_owned()))
            }
        }
    }
}

/// Parse an id path segment; ids that can't exist are simply not found.
pub(crate) fn parse_id<I: From<i32>>(raw: &str, not_found: &str) -> Result<I, AppError> {
    raw.parse::<i32>()
        .map(I::from)
        .map_err(|_| AppError::NotFound(not_found.to_owned()))
}

// =============================================================================
// Routers
// =============================================================================

/// Routes behind the bearer token and role gate.
fn gated_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            get(admin::show_user).delete(admin::delete_user),
        )
        .route("/profile", get(profile::show))
        .route("/profile/credentials", put(profile::update_credentials))
        .route("/profile/password", put(profile::change_password))
        .route("/profile/avatar", put(profile::update_avatar))
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route(
            "/cart",
            get(cart::show)
                .post(cart::add)
                .put(cart::update)
                .delete(cart::remove),
        )
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn(role_gate))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
}

/// Login and registration, rate limited per client IP.
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .method_not_allowed_fallback(method_not_allowed)
        .layer(credentials_rate_limiter())
}

/// Create all API routes.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/avatars", get(avatars::index))
        .route_service(
            "/avatars/{file}",
            ServeDir::new(state.config().public_dir.clone()),
        )
        .method_not_allowed_fallback(method_not_allowed)
        .merge(session_routes())
        .merge(gated_routes(state))
        .fallback(path_not_found)
}

async fn path_not_found() -> AppError {
    AppError::NotFound("Path not found".to_owned())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, http::StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::tests::test_config;

    /// Router over a pool that never connects; only paths that resolve
    /// before touching the database may be exercised.
    fn app() -> Router {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/shopfront_test")
            .unwrap();
        let state = AppState::new(config, pool);
        routes(&state).with_state(state)
    }

    async fn send(request: Request) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    fn get_request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let (status, body) = send(get_request("/orders")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Path not found");
    }

    #[tokio::test]
    async fn test_cart_requires_token() {
        let (status, body) = send(get_request("/cart")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Token missing");
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let (status, body) = send(get_request("/users/3")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Token missing");
    }

    #[tokio::test]
    async fn test_anonymous_product_write_is_forbidden() {
        let request = Request::builder()
            .method("POST")
            .uri("/products")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"Mug","description":"Ceramic","price":12}"#))
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Unauthorized access");
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let request = Request::builder()
            .uri("/products")
            .header("authorization", "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token");
    }

    #[tokio::test]
    async fn test_non_bearer_header_rejected() {
        let request = Request::builder()
            .uri("/cart")
            .header("authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token");
    }

    #[tokio::test]
    async fn test_unsupported_method_on_gated_path() {
        let request = Request::builder()
            .method("PATCH")
            .uri("/cart")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unrouted_method_on_public_path() {
        let request = Request::builder()
            .method("DELETE")
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["message"], "Method not allowed");
    }

    #[test]
    fn test_parse_id() {
        let id: shopfront_core::ProductId = parse_id("42", "Product not found").unwrap();
        assert_eq!(id.as_i32(), 42);
        assert!(matches!(
            parse_id::<shopfront_core::ProductId>("abc", "Product not found"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_success_envelope_flattens_data() {
        #[derive(Serialize)]
        struct Data {
            count: u8,
        }

        let json = serde_json::to_value(Success::with_message("Done", Data { count: 2 })).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "Done", "count": 2}));

        let json = serde_json::to_value(Success::new(())).unwrap();
        assert_eq!(json, serde_json::json!({"success": true}));
    }
}
