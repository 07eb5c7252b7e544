//! Cart mutation logic.
//!
//! Every operation acts on the caller's own cart and returns the resulting
//! [`CartView`].

use sqlx::PgPool;
use thiserror::Error;

use shopfront_core::{ProductId, Quantity, UserId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::{Cart, CartView};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product doesn't exist.
    #[error("product not found")]
    ProductNotFound,

    /// The user has no cart yet.
    #[error("cart not found")]
    CartNotFound,

    /// The product isn't in the user's cart.
    #[error("product not found in cart")]
    NotInCart,

    /// Quantity missing, zero, or negative.
    #[error("quantity must be greater than 0")]
    InvalidQuantity,

    /// Merging into the existing line would exceed the largest quantity.
    #[error("quantity is too large")]
    QuantityTooLarge,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// The user's cart; empty if they never added anything.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn view(&self, user_id: UserId) -> Result<CartView, CartError> {
        Ok(self.carts.find_by_user(user_id).await?.into())
    }

    /// Add `quantity` (default 1) units of a product, creating the cart if
    /// needed and merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity` is not positive.
    /// Returns `CartError::ProductNotFound` if the product doesn't exist.
    /// Returns `CartError::QuantityTooLarge` if the merged line would overflow.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Option<i32>,
    ) -> Result<CartView, CartError> {
        let quantity = match quantity {
            Some(q) => Quantity::new(q).map_err(|_| CartError::InvalidQuantity)?,
            None => Quantity::ONE,
        };

        if self.products.get(product_id).await?.is_none() {
            return Err(CartError::ProductNotFound);
        }

        let cart = self.carts.find_by_user(user_id).await?;
        check_add(cart.as_ref(), product_id, quantity)?;

        self.carts
            .add_item(user_id, product_id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ProductNotFound,
                RepositoryError::Conflict(_) => CartError::QuantityTooLarge,
                other => CartError::Repository(other),
            })?;

        tracing::debug!(%user_id, %product_id, %quantity, "Added to cart");
        self.view(user_id).await
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound`, `CartError::NotInCart` or
    /// `CartError::InvalidQuantity`, checked in that order.
    pub async fn update(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Option<i32>,
    ) -> Result<CartView, CartError> {
        let cart = self.carts.find_by_user(user_id).await?;
        let quantity = check_update(cart.as_ref(), product_id, quantity)?;

        if !self.carts.set_quantity(user_id, product_id, quantity).await? {
            return Err(CartError::NotInCart);
        }

        self.view(user_id).await
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` or `CartError::NotInCart`.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartView, CartError> {
        let cart = self.carts.find_by_user(user_id).await?;
        check_present(cart.as_ref(), product_id)?;

        if !self.carts.remove_item(user_id, product_id).await? {
            return Err(CartError::NotInCart);
        }

        self.view(user_id).await
    }
}

fn check_present(cart: Option<&Cart>, product_id: ProductId) -> Result<(), CartError> {
    let cart = cart.ok_or(CartError::CartNotFound)?;
    if cart.contains(product_id) {
        Ok(())
    } else {
        Err(CartError::NotInCart)
    }
}

/// The merged quantity must still fit in a cart line.
fn check_add(
    cart: Option<&Cart>,
    product_id: ProductId,
    quantity: Quantity,
) -> Result<(), CartError> {
    match cart.and_then(|cart| cart.line(product_id)) {
        Some(line) => line
            .quantity
            .checked_add(quantity)
            .map(|_| ())
            .ok_or(CartError::QuantityTooLarge),
        None => Ok(()),
    }
}

fn check_update(
    cart: Option<&Cart>,
    product_id: ProductId,
    quantity: Option<i32>,
) -> Result<Quantity, CartError> {
    check_present(cart, product_id)?;
    quantity
        .and_then(|q| Quantity::new(q).ok())
        .ok_or(CartError::InvalidQuantity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shopfront_core::{CartId, Price};

    use super::*;
    use crate::models::{CartLine, Product};

    fn cart_with(product_ids: &[i32]) -> Cart {
        Cart {
            id: CartId::new(1),
            user_id: UserId::new(1),
            lines: product_ids
                .iter()
                .map(|&id| CartLine {
                    product: Product {
                        id: ProductId::new(id),
                        name: format!("Product {id}"),
                        description: "Test".to_string(),
                        price: Price::new(Decimal::ONE).unwrap(),
                        created_at: Utc::now(),
                        updated_at: Utc::now(),
                    },
                    quantity: Quantity::ONE,
                })
                .collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_update_without_cart() {
        assert!(matches!(
            check_update(None, ProductId::new(1), Some(0)),
            Err(CartError::CartNotFound)
        ));
    }

    #[test]
    fn test_update_product_not_in_cart_precedes_quantity() {
        let cart = cart_with(&[1]);
        assert!(matches!(
            check_update(Some(&cart), ProductId::new(2), Some(-1)),
            Err(CartError::NotInCart)
        ));
    }

    #[test]
    fn test_update_rejects_non_positive_quantity() {
        let cart = cart_with(&[1]);
        for quantity in [Some(0), Some(-3), None] {
            assert!(matches!(
                check_update(Some(&cart), ProductId::new(1), quantity),
                Err(CartError::InvalidQuantity)
            ));
        }
    }

    #[test]
    fn test_update_accepts_positive_quantity() {
        let cart = cart_with(&[1, 2]);
        let quantity = check_update(Some(&cart), ProductId::new(2), Some(5)).unwrap();
        assert_eq!(quantity.get(), 5);
    }

    #[test]
    fn test_add_rejects_overflowing_merge() {
        let cart = cart_with(&[1]);
        let max = Quantity::new(i32::MAX).unwrap();

        assert!(matches!(
            check_add(Some(&cart), ProductId::new(1), max),
            Err(CartError::QuantityTooLarge)
        ));
        assert!(check_add(Some(&cart), ProductId::new(2), max).is_ok());
        assert!(check_add(None, ProductId::new(1), max).is_ok());
        assert!(check_add(Some(&cart), ProductId::new(1), Quantity::ONE).is_ok());
    }

    #[test]
    fn test_remove_checks() {
        assert!(matches!(
            check_present(None, ProductId::new(1)),
            Err(CartError::CartNotFound)
        ));
        assert!(matches!(
            check_present(Some(&cart_with(&[])), ProductId::new(1)),
            Err(CartError::NotInCart)
        ));
        assert!(check_present(Some(&cart_with(&[1])), ProductId::new(1)).is_ok());
    }
}
