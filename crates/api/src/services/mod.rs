//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login, and profile updates
//! - `token` - Bearer token issuing and verification
//! - `cart` - Cart mutations (find-or-create, quantity merge, removal)
//! - `avatars` - Preset avatar catalog

pub mod auth;
pub mod avatars;
pub mod cart;
pub mod token;

pub use auth::{AuthError, AuthService};
pub use avatars::{AvatarCatalog, AvatarError};
pub use cart::{CartError, CartService};
pub use token::{TokenError, TokenService};
