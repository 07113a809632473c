//! Admin user repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use deinshop_core::{AdminUserId, Email};

use super::RepositoryError;
use crate::models::AdminUser;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for admin user queries.
#[derive(sqlx::FromRow)]
struct AdminUserRow {
    id: AdminUserId,
    username: String,
    email: String,
    password_hash: String,
    is_owner: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            username: row.username,
            email,
            password_hash: row.password_hash,
            is_owner: row.is_owner,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_login_at: row.last_login_at,
        })
    }
}

const CONFLICT_MESSAGE: &str = "Username or email already exists";

// =============================================================================
// Repository
// =============================================================================

/// Repository for admin user database operations.
pub struct AdminUserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Count all admin users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// List all admin users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminUserRow>(
            r"
            SELECT id, username, email, password_hash, is_owner,
                   created_at, updated_at, last_login_at
            FROM admin_users
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an admin user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            SELECT id, username, email, password_hash, is_owner,
                   created_at, updated_at, last_login_at
            FROM admin_users
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an admin user by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            SELECT id, username, email, password_hash, is_owner,
                   created_at, updated_at, last_login_at
            FROM admin_users
            WHERE username = ?
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create the first admin user as owner, only if no admin exists yet.
    ///
    /// The emptiness check and the insert are one statement, so two
    /// concurrent setup requests cannot both succeed. Returns `None` when an
    /// admin already exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[tracing::instrument(skip(self, email, password_hash))]
    pub async fn create_first_owner(
        &self,
        username: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<Option<AdminUser>, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            INSERT INTO admin_users (username, email, password_hash, is_owner,
                                     created_at, updated_at, last_login_at)
            SELECT ?, ?, ?, 1, ?, ?, ?
            WHERE NOT EXISTS (SELECT 1 FROM admin_users)
            RETURNING id, username, email, password_hash, is_owner,
                      created_at, updated_at, last_login_at
            ",
        )
        .bind(username)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new admin user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip(self, email, password_hash))]
    pub async fn create(
        &self,
        username: &str,
        email: &Email,
        password_hash: &str,
        is_owner: bool,
    ) -> Result<AdminUser, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            INSERT INTO admin_users (username, email, password_hash, is_owner,
                                     created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, username, email, password_hash, is_owner,
                      created_at, updated_at, last_login_at
            ",
        )
        .bind(username)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(is_owner)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, CONFLICT_MESSAGE))?;

        row.try_into()
    }

    /// Record a successful login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn touch_last_login(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE admin_users SET last_login_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Delete an admin user and every session they hold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip(self), fields(admin_user_id = %id))]
    pub async fn delete_with_sessions(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM sessions WHERE admin_user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM admin_users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
