//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as the JSON
//! envelope `{"success": false, "message": ..., "errors"?: {...}}`; server
//! errors are captured to Sentry and never leak details to the client.

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tower_governor::GovernorError;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::avatars::AvatarError;
use crate::services::cart::CartError;
use crate::services::token::TokenError;

/// Per-field validation messages, keyed by the camelCase request field.
///
/// Only the first message recorded for a field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// No errors.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// A single error on `field`.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record an error unless `field` already has one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Message recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors if any were recorded.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().copied().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication or account operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Bearer token rejected or not issued.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Avatar catalog error.
    #[error("Avatar error: {0}")]
    Avatar(#[from] AvatarError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller's role may not use this route.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unique constraint would be violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP method not allowed on this path.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Rejected by the credentials rate limiter.
    #[error("Rate limit: {0}")]
    RateLimit(#[from] GovernorError),
}

/// JSON error envelope.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

const SERVER_ERROR: &str = "Server error";

impl AppError {
    /// Status code, client-facing message and optional field errors.
    fn parts(&self) -> (StatusCode, String, Option<FieldErrors>) {
        let server_error = || {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                SERVER_ERROR.to_owned(),
                None,
            )
        };

        match self {
            Self::Database(_) => server_error(),
            Self::Auth(err) => match err {
                AuthError::Validation(errors) => (
                    StatusCode::BAD_REQUEST,
                    "Validation error".to_owned(),
                    Some(errors.clone()),
                ),
                AuthError::AlreadyRegistered => (
                    StatusCode::CONFLICT,
                    "Already registered".to_owned(),
                    Some(FieldErrors::single("email", "Email already registered")),
                ),
                AuthError::EmailInUse => (
                    StatusCode::CONFLICT,
                    "Email already in use".to_owned(),
                    Some(FieldErrors::single("email", "Email already registered")),
                ),
                AuthError::EmailNotRegistered => (
                    StatusCode::UNAUTHORIZED,
                    "Invalid credentials".to_owned(),
                    Some(FieldErrors::single("email", "Email is not registered")),
                ),
                AuthError::IncorrectPassword => (
                    StatusCode::UNAUTHORIZED,
                    "Invalid credentials".to_owned(),
                    Some(FieldErrors::single("password", "Password is incorrect")),
                ),
                AuthError::UserNotFound => {
                    (StatusCode::NOT_FOUND, "User not found".to_owned(), None)
                }
                AuthError::Token(_)
                | AuthError::Avatar(_)
                | AuthError::Repository(_)
                | AuthError::PasswordHash => server_error(),
            },
            Self::Cart(err) => match err {
                CartError::ProductNotFound => {
                    (StatusCode::NOT_FOUND, "Product not found".to_owned(), None)
                }
                CartError::CartNotFound => {
                    (StatusCode::NOT_FOUND, "Cart not found".to_owned(), None)
                }
                CartError::NotInCart => (
                    StatusCode::NOT_FOUND,
                    "Product not found in cart".to_owned(),
                    None,
                ),
                CartError::InvalidQuantity => (
                    StatusCode::BAD_REQUEST,
                    "Quantity must be greater than 0".to_owned(),
                    None,
                ),
                CartError::QuantityTooLarge => (
                    StatusCode::BAD_REQUEST,
                    "Quantity is too large".to_owned(),
                    None,
                ),
                CartError::Repository(_) => server_error(),
            },
            Self::Token(err) => match err {
                TokenError::Invalid(_) | TokenError::InvalidSubject => {
                    (StatusCode::UNAUTHORIZED, "Invalid token".to_owned(), None)
                }
                TokenError::Signing(_) => server_error(),
            },
            Self::Avatar(err) => match err {
                AvatarError::NotInCatalog => (
                    StatusCode::BAD_REQUEST,
                    "Validation error".to_owned(),
                    Some(FieldErrors::single("avatar", "Avatar is not available")),
                ),
                AvatarError::Io(_) => server_error(),
            },
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".to_owned(),
                None,
            ),
            Self::RateLimit(err) => match err {
                GovernorError::TooManyRequests { .. } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Too many requests".to_owned(),
                    None,
                ),
                GovernorError::UnableToExtractKey | GovernorError::Other { .. } => {
                    server_error()
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = self.parts();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            success: false,
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product not found".to_string());
        assert_eq!(err.to_string(), "Not found: Product not found");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.add("name", "Name is required");
        errors.add("name", "Name must be at least 3 characters long");
        errors.add("email", "Invalid email format");

        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.to_string(), "invalid fields: email, name");
        assert_eq!(
            errors.iter().collect::<Vec<_>>(),
            vec![("email", "Invalid email format"), ("name", "Name is required")]
        );
        assert!(errors.into_result().is_err());
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[tokio::test]
    async fn test_app_error_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED),
            (
                RepositoryError::NotFound.into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(render(err).await.0, expected);
        }
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let (status, body) = render(AppError::NotFound("Product not found".into())).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Product not found");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let err = RepositoryError::DataCorruption("invalid email in row 7".into());
        let (status, body) = render(err.into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server error");
    }

    #[tokio::test]
    async fn test_validation_errors_listed() {
        let err: AppError =
            AuthError::Validation(FieldErrors::single("email", "Invalid email format")).into();
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(body["errors"]["email"], "Invalid email format");
    }

    #[tokio::test]
    async fn test_login_failures_name_the_field() {
        let (status, body) = render(AuthError::EmailNotRegistered.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
        assert_eq!(body["errors"]["email"], "Email is not registered");

        let (_, body) = render(AuthError::IncorrectPassword.into()).await;
        assert_eq!(body["errors"]["password"], "Password is incorrect");
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_conflict() {
        let (status, body) = render(AuthError::AlreadyRegistered.into()).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Already registered");
        assert_eq!(body["errors"]["email"], "Email already registered");
    }

    #[tokio::test]
    async fn test_cart_errors() {
        let (status, body) = render(CartError::NotInCart.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product not found in cart");

        let (status, body) = render(CartError::InvalidQuantity.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Quantity must be greater than 0");

        let (status, body) = render(CartError::QuantityTooLarge.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Quantity is too large");
    }

    #[tokio::test]
    async fn test_rate_limit_renders_envelope() {
        let err = GovernorError::TooManyRequests {
            wait_time: 6,
            headers: None,
        };
        let (status, body) = render(err.into()).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Too many requests");

        let (status, _) = render(GovernorError::UnableToExtractKey.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_bad_token_is_unauthorized() {
        let (status, body) = render(TokenError::InvalidSubject.into()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token");
    }
}
