//! Database migration command.
//!
//! Applies the migrations embedded from `crates/api/migrations/`; the API
//! server never migrates on startup.

use super::{CommandError, connect};

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    shopfront_api::db::MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
