//! Session maintenance.
//!
//! Expired sessions are already refused at request time; pruning only keeps
//! the table small. Safe to run from cron at any interval.

use chrono::Utc;
use secrecy::SecretString;

use deinshop_server::db::{self, RepositoryError, SessionRepository};

/// Delete every session whose expiry has passed.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the delete fails.
pub async fn prune(database_url: &SecretString) -> Result<u64, RepositoryError> {
    let pool = db::create_pool(database_url).await?;
    let removed = SessionRepository::new(&pool)
        .delete_expired(Utc::now())
        .await?;

    tracing::info!(removed, "Expired sessions pruned");
    pool.close().await;
    Ok(removed)
}
