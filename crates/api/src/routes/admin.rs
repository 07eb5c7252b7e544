//! Admin dashboard and user management.
//!
//! Only reachable by admins; the role gate rejects everyone else before
//! these handlers run.

use axum::extract::{Path, State};
use serde::Serialize;
use tracing::instrument;

use shopfront_core::UserId;

use super::{Success, parse_id};
use crate::db::{CartRepository, ProductRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{CartSummary, Product, User};
use crate::state::AppState;

const NOT_FOUND: &str = "User not found";

#[derive(Debug, Serialize)]
pub struct Dashboard {
    user: User,
    users: Vec<User>,
    products: Vec<Product>,
    carts: Vec<CartSummary>,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserBody {
    user: User,
}

/// `GET /admin`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Success<Dashboard>> {
    let pool = state.pool();
    let user_repo = UserRepository::new(pool);
    let product_repo = ProductRepository::new(pool);
    let cart_repo = CartRepository::new(pool);
    let (users, products, carts) = tokio::try_join!(
        user_repo.list_all(),
        product_repo.list(),
        cart_repo.list_summaries(),
    )?;

    Ok(Success::with_message(
        "Welcome to admin dashboard",
        Dashboard {
            user,
            users,
            products,
            carts,
        },
    ))
}

/// `GET /users`
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Success<UserList>> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(Success::new(UserList { users }))
}

/// `GET /users/{id}`
#[instrument(skip(state))]
pub async fn show_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Success<UserBody>> {
    let id: UserId = parse_id(&id, NOT_FOUND)?;
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))?;

    Ok(Success::new(UserBody { user }))
}

/// `DELETE /users/{id}`
///
/// The user's cart is removed by the foreign key cascade.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireUser(admin): RequireUser,
    Path(id): Path<String>,
) -> Result<Success<()>> {
    let id: UserId = parse_id(&id, NOT_FOUND)?;
    if id == admin.id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_owned(),
        ));
    }

    if !UserRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound(NOT_FOUND.to_owned()));
    }

    tracing::info!(user_id = %id, "User deleted");
    Ok(Success::with_message("User deleted successfully", ()))
}
