//! Cart repository for database operations.
//!
//! A cart row is created lazily on the first add. Lines are unique per
//! `(cart_id, product_id)`; adding a product already in the cart increments
//! the existing line instead of inserting a second one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopfront_core::{CartId, ProductId, Quantity, UserId};

use super::RepositoryError;
use super::products::ProductRow;
use crate::models::{Cart, CartEntry, CartLine, CartSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// A cart line joined with its product.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    quantity: Quantity,
    #[sqlx(flatten)]
    product: ProductRow,
}

#[derive(Debug, sqlx::FromRow)]
struct CartEntryRow {
    cart_id: CartId,
    product_id: ProductId,
    quantity: Quantity,
}

impl CartRow {
    fn with_lines(self, lines: Vec<CartLine>) -> Cart {
        Cart {
            id: self.id,
            user_id: self.user_id,
            lines,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a user's cart with its products, lines in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let Some(cart) = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at, updated_at FROM shop.cart WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.quantity,
                   p.id, p.name, p.description, p.price, p.created_at, p.updated_at
            FROM shop.cart_item ci
            JOIN shop.product p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.id ASC
            ",
        )
        .bind(cart.id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|row| CartLine {
            product: row.product.into(),
            quantity: row.quantity,
        })
        .collect();

        Ok(Some(cart.with_lines(lines)))
    }

    /// Add `quantity` units of a product to the user's cart.
    ///
    /// Creates the cart if the user has none and increments the line if the
    /// product is already present. Both upserts run in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product or user disappeared
    /// concurrently (foreign key violation).
    /// Returns `RepositoryError::Conflict` if the merged quantity would not fit
    /// in an `INTEGER`; nothing is written.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let cart_id = sqlx::query_scalar::<_, CartId>(
            r"
            INSERT INTO shop.cart (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_foreign_key_violation)?;

        let result = sqlx::query(
            r"
            INSERT INTO shop.cart_item AS ci (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = ci.quantity + EXCLUDED.quantity
            WHERE ci.quantity::bigint + EXCLUDED.quantity <= 2147483647
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await
        .map_err(map_foreign_key_violation)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "cart line quantity out of range".to_owned(),
            ));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Set the quantity of a product already in the user's cart.
    ///
    /// # Returns
    ///
    /// Returns `false` if the user has no cart or the product isn't in it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE shop.cart_item ci
            SET quantity = $3
            FROM shop.cart c
            WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        touch(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Remove a product from the user's cart.
    ///
    /// # Returns
    ///
    /// Returns `false` if the user has no cart or the product isn't in it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            DELETE FROM shop.cart_item ci
            USING shop.cart c
            WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        touch(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Every cart with its `(product, quantity)` entries, for the admin
    /// dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_summaries(&self) -> Result<Vec<CartSummary>, RepositoryError> {
        let carts = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at, updated_at FROM shop.cart ORDER BY id ASC",
        )
        .fetch_all(self.pool)
        .await?;

        let entries = sqlx::query_as::<_, CartEntryRow>(
            "SELECT cart_id, product_id, quantity FROM shop.cart_item ORDER BY id ASC",
        )
        .fetch_all(self.pool)
        .await?;

        let mut by_cart: HashMap<CartId, Vec<CartEntry>> = HashMap::new();
        for entry in entries {
            by_cart.entry(entry.cart_id).or_default().push(CartEntry {
                product_id: entry.product_id,
                quantity: entry.quantity,
            });
        }

        Ok(carts
            .into_iter()
            .map(|cart| CartSummary {
                products: by_cart.remove(&cart.id).unwrap_or_default(),
                id: cart.id,
                user_id: cart.user_id,
                created_at: cart.created_at,
                updated_at: cart.updated_at,
            })
            .collect())
    }
}

/// Bump the cart's `updated_at` inside an open transaction.
async fn touch(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.cart SET updated_at = NOW() WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn map_foreign_key_violation(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}
