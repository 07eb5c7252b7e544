//! Login and registration.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{JsonBody, Success};
use crate::error::Result;
use crate::models::User;
use crate::services::auth::{Registration, Session};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

/// `{token, user}` returned by both routes.
#[derive(Debug, Serialize)]
pub struct SessionBody {
    token: String,
    user: User,
}

impl From<Session> for SessionBody {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            user: session.user,
        }
    }
}

/// `POST /register`
#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<Success<SessionBody>> {
    let session = state
        .auth()
        .register(Registration {
            name: body.name.as_deref(),
            email: body.email.as_deref(),
            password: body.password.as_deref(),
            avatar: body.avatar.as_deref(),
        })
        .await?;

    tracing::info!(user_id = %session.user.id, "User registered");
    Ok(Success::with_message(
        "Successfully registered",
        session.into(),
    ))
}

/// `POST /login`
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Success<SessionBody>> {
    let session = state
        .auth()
        .login(body.email.as_deref(), body.password.as_deref())
        .await?;

    tracing::info!(user_id = %session.user.id, "User logged in");
    Ok(Success::with_message("Successfully logged in", session.into()))
}
