//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with `request_id`)
//! 3. Request ID (`x-request-id`, generated when absent)
//! 4. Security headers
//! 5. CORS (client origin only)
//! 6. Rate limiting (`/login`, `/register`)
//! 7. Authentication (bearer token to [`crate::models::CurrentUser`]), gated routes
//! 8. Role gate (static path table), gated routes

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod role;
pub mod security_headers;

pub use auth::{RequireUser, authenticate};
pub use rate_limit::credentials_rate_limiter;
pub use request_id::request_id_middleware;
pub use role::role_gate;
pub use security_headers::security_headers_middleware;
