//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ds-cli migrate
//! ```
//!
//! Migrations are embedded from `crates/server/migrations/`, so the binary
//! applies exactly the schema the server was built against.

use secrecy::SecretString;
use thiserror::Error;

use deinshop_server::db::{self, MIGRATOR};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or a migration fails.
pub async fn run(database_url: &SecretString) -> Result<(), MigrationError> {
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(database_url).await?;

    tracing::info!(available = MIGRATOR.iter().count(), "Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    pool.close().await;
    Ok(())
}
