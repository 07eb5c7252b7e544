//! Bearer token authentication middleware and extractors.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, User};
use crate::state::AppState;

/// Resolve the `Authorization: Bearer` header to a user.
///
/// - no header: the request continues anonymously
/// - malformed header or bad token: 401 `Invalid token`
/// - token for a deleted user: 404 `User not found`
///
/// On success the user is stored in request extensions as [`CurrentUser`].
///
/// # Errors
///
/// Returns `AppError` as listed above; handlers never run in that case.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return Ok(next.run(request).await);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Unauthorized("Invalid token".to_owned()))?;

    let user_id = state.tokens().verify(token)?;

    let user = UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Token from a `Bearer <token>` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Extractor that requires an authenticated user.
///
/// Rejects with 401 `Token missing` when [`authenticate`] attached no user.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireUser(user): RequireUser) -> Json<User> {
///     Json(user)
/// }
/// ```
pub struct RequireUser(pub User);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|current| Self(current.0.clone()))
            .ok_or_else(|| AppError::Unauthorized("Token missing".to_owned()))
    }
}
