//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::{AvatarCatalog, AuthService, CartService, TokenService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    tokens: TokenService,
    avatars: AvatarCatalog,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_hours);
        let avatars = AvatarCatalog::new(config.avatar_dir());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                avatars,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn avatars(&self) -> &AvatarCatalog {
        &self.inner.avatars
    }

    /// Authentication service borrowing this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.pool(), self.tokens(), self.avatars())
    }

    /// Cart service borrowing this state.
    #[must_use]
    pub fn carts(&self) -> CartService<'_> {
        CartService::new(self.pool())
    }
}
