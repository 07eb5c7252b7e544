//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopfront_core::{Email, Role, UserId};

/// A storefront account.
///
/// The password hash is deliberately absent; it is only ever read by
/// [`crate::db::UserRepository::get_password_hash`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email address.
    pub email: Email,
    /// Account role.
    pub role: Role,
    /// Catalog path of the chosen avatar (e.g. `avatars/fox.png`).
    pub avatar: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The authenticated user attached to a request by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// The user's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.0.role
    }
}
