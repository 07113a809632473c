//! Database operations on the directory's `SQLite` database.
//!
//! ## Tables
//!
//! - `categories` - Shop categories with optional cover image
//! - `shops` - Listed shops (`is_active = 0` hides them publicly)
//! - `shops_fts` - FTS5 index over shop text, maintained by triggers
//! - `submissions` - Community shop proposals and their review state
//! - `admin_users` - Admin accounts
//! - `sessions` - Admin login sessions
//! - `dead_link_reports` - Visitor reports of unreachable shops
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and are embedded in
//! [`MIGRATOR`]. Run them via:
//! ```bash
//! cargo run -p deinshop-cli -- migrate
//! ```

pub mod admin_users;
pub mod categories;
pub mod dead_link_reports;
pub mod sessions;
pub mod shops;
pub mod stats;
pub mod submissions;

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use admin_users::AdminUserRepository;
pub use categories::CategoryRepository;
pub use dead_link_reports::DeadLinkReportRepository;
pub use sessions::SessionRepository;
pub use shops::ShopRepository;
pub use stats::StatsRepository;
pub use submissions::SubmissionRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    pub(crate) fn from_unique_violation(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `SQLite` connection pool.
///
/// The database file is created if missing. WAL journaling and foreign key
/// enforcement are enabled on every connection.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is malformed or the database cannot be opened.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create a private in-memory database with one long-lived connection.
///
/// Each in-memory `SQLite` connection is its own database, so the pool is
/// pinned to a single connection that is never recycled.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be opened.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    #[allow(clippy::expect_used)]
    let pool = create_memory_pool().await.expect("in-memory pool");
    #[allow(clippy::expect_used)]
    MIGRATOR.run(&pool).await.expect("migrations");
    pool
}
