//! CLI subcommands.
//!
//! # Environment Variables
//!
//! - `SHOPFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use shopfront_api::db::{self, RepositoryError};
use shopfront_api::error::FieldErrors;
use shopfront_api::services::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Invalid role name.
    #[error("Invalid role: {0}. Valid roles: user, admin")]
    InvalidRole(String),

    /// Input failed validation; one message per field.
    #[error("{}", describe(.0))]
    Invalid(FieldErrors),

    /// Account already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    /// No account with this email.
    #[error("No user with email: {0}")]
    UserNotFound(String),

    /// Seed file could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Seed file is not valid YAML for its target.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn describe(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Connect to the storefront database.
async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SHOPFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("SHOPFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
