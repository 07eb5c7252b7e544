//! Preset avatar listing. The images themselves are served by `ServeDir`.

use axum::extract::State;
use serde::Serialize;

use super::Success;
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AvatarList {
    avatars: Vec<String>,
}

/// `GET /avatars`
pub async fn index(State(state): State<AppState>) -> Result<Success<AvatarList>> {
    let avatars = state.avatars().list().await?;
    Ok(Success::new(AvatarList { avatars }))
}
