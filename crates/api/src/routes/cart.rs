//! Cart handlers. Every route acts on the caller's own cart.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use shopfront_core::ProductId;

use super::{JsonBody, Success};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::CartView;
use crate::state::AppState;

/// Body of `POST`, `PUT` and `DELETE /cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRequest {
    product_id: Option<ProductId>,
    quantity: Option<i32>,
}

impl CartRequest {
    fn product_id(&self) -> Result<ProductId> {
        self.product_id
            .ok_or_else(|| AppError::BadRequest("Product ID is required".to_owned()))
    }
}

#[derive(Debug, Serialize)]
pub struct CartBody {
    cart: CartView,
}

/// `GET /cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Success<CartBody>> {
    let cart = state.carts().view(user.id).await?;
    Ok(Success::new(CartBody { cart }))
}

/// `POST /cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    JsonBody(body): JsonBody<CartRequest>,
) -> Result<Success<CartBody>> {
    let product_id = body.product_id()?;
    let cart = state
        .carts()
        .add(user.id, product_id, body.quantity)
        .await?;

    Ok(Success::with_message(
        "Product added to cart successfully",
        CartBody { cart },
    ))
}

/// `PUT /cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    JsonBody(body): JsonBody<CartRequest>,
) -> Result<Success<CartBody>> {
    let product_id = body.product_id()?;
    let cart = state
        .carts()
        .update(user.id, product_id, body.quantity)
        .await?;

    Ok(Success::with_message("Cart updated successfully", CartBody { cart }))
}

/// `DELETE /cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    JsonBody(body): JsonBody<CartRequest>,
) -> Result<Success<CartBody>> {
    let product_id = body.product_id()?;
    let cart = state.carts().remove(user.id, product_id).await?;

    Ok(Success::with_message(
        "Product removed from cart successfully",
        CartBody { cart },
    ))
}
