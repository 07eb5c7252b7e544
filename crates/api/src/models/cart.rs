//! Cart domain types and the view returned to the client.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use shopfront_core::{CartId, ProductId, Quantity, UserId};

use super::Product;

/// A user's cart with its products loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// Owner of the cart (one cart per user).
    pub user_id: UserId,
    /// Lines in insertion order, at most one per product.
    pub lines: Vec<CartLine>,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
    /// When the cart was last modified.
    pub updated_at: DateTime<Utc>,
}

/// One product in a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// The product, as currently listed.
    pub product: Product,
    /// Units of the product.
    pub quantity: Quantity,
}

impl CartLine {
    /// Price times quantity.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.product.price.times(self.quantity)
    }
}

impl Cart {
    /// The line holding `product_id`, if any.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.id == product_id)
    }

    /// Whether the cart holds `product_id`.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.line(product_id).is_some()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.lines
            .iter()
            .map(|line| i64::from(line.quantity.get()))
            .sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::total).sum()
    }
}

/// Cart as returned by the `/cart` endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

/// One line of a [`CartView`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product: Product,
    pub quantity: Quantity,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
}

impl CartView {
    /// View for a user who has no cart yet.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            item_count: 0,
            subtotal: Decimal::ZERO,
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .lines
                .iter()
                .map(|line| CartItemView {
                    product: line.product.clone(),
                    quantity: line.quantity,
                    line_total: line.total(),
                })
                .collect(),
            item_count: cart.item_count(),
            subtotal: cart.subtotal(),
        }
    }
}

impl From<Option<Cart>> for CartView {
    fn from(cart: Option<Cart>) -> Self {
        cart.as_ref().map_or_else(Self::empty, Self::from)
    }
}

/// Cart listing for the admin dashboard (product ids only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub id: CartId,
    pub user_id: UserId,
    pub products: Vec<CartEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A `(product, quantity)` pair in a [`CartSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub product_id: ProductId,
    pub quantity: Quantity,
}
