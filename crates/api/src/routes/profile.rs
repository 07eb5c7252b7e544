//! Account pages for the signed-in user.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{JsonBody, Success};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::User;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserBody {
    user: User,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordRequest {
    current_password: Option<String>,
    new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    avatar: Option<String>,
}

/// `GET /profile`
#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn show(RequireUser(user): RequireUser) -> Success<UserBody> {
    Success::with_message("Welcome to user dashboard", UserBody { user })
}

/// `PUT /profile/credentials`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_credentials(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    JsonBody(body): JsonBody<CredentialsRequest>,
) -> Result<Success<UserBody>> {
    let user = state
        .auth()
        .update_credentials(user.id, body.name.as_deref(), body.email.as_deref())
        .await?;

    Ok(Success::with_message(
        "Credentials updated successfully",
        UserBody { user },
    ))
}

/// `PUT /profile/password`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    JsonBody(body): JsonBody<PasswordRequest>,
) -> Result<Success<()>> {
    state
        .auth()
        .change_password(
            user.id,
            body.current_password.as_deref(),
            body.new_password.as_deref(),
        )
        .await?;

    Ok(Success::with_message("Password updated successfully", ()))
}

/// `PUT /profile/avatar`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update_avatar(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    JsonBody(body): JsonBody<AvatarRequest>,
) -> Result<Success<UserBody>> {
    let user = state
        .auth()
        .update_avatar(user.id, body.avatar.as_deref())
        .await?;

    Ok(Success::with_message(
        "Avatar updated successfully",
        UserBody { user },
    ))
}
