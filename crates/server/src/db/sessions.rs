//! Session repository.
//!
//! Expiry is evaluated by callers at read time; [`SessionRepository::delete_expired`]
//! is a maintenance sweep that nothing on the request path depends on.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use deinshop_core::AdminUserId;

use super::RepositoryError;
use crate::models::Session;

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    admin_user_id: AdminUserId,
    is_owner: bool,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            admin_user_id: row.admin_user_id,
            is_owner: row.is_owner,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

/// Repository for session database operations.
pub struct SessionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SessionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        token: &str,
        admin_user_id: AdminUserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sessions (id, admin_user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token)
        .bind(admin_user_id)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Look up a session together with its owner's privilege flag.
    ///
    /// Expired sessions are returned as-is; checking expiry is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&self, token: &str) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT s.id, s.admin_user_id, u.is_owner, s.expires_at, s.created_at
            FROM sessions s
            JOIN admin_users u ON u.id = s.admin_user_id
            WHERE s.id = ?
            ",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, token: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(token)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Remove all sessions that expired before `now`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
