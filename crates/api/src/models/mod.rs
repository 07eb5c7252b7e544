//! Domain models for the storefront.
//!
//! These types are validated domain objects, separate from the database row
//! types in [`crate::db`]. They serialize directly into API responses (with
//! camelCase keys), so none of them carry secrets.

pub mod cart;
pub mod product;
pub mod user;

pub use cart::{Cart, CartEntry, CartLine, CartSummary, CartView};
pub use product::{NewProduct, Product};
pub use user::{CurrentUser, User};
