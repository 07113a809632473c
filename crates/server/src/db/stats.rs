//! Aggregate counts for the admin dashboard.

use serde::Serialize;
use sqlx::SqlitePool;

use super::RepositoryError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub shops: i64,
    pub active_shops: i64,
    pub categories: i64,
    pub pending_submissions: i64,
    pub total_submissions: i64,
    pub dead_link_reports: i64,
}

pub struct StatsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StatsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn dashboard(&self) -> Result<DashboardStats, RepositoryError> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r"
            SELECT
                (SELECT COUNT(*) FROM shops) AS shops,
                (SELECT COUNT(*) FROM shops WHERE is_active = 1) AS active_shops,
                (SELECT COUNT(*) FROM categories) AS categories,
                (SELECT COUNT(*) FROM submissions WHERE status = 'pending') AS pending_submissions,
                (SELECT COUNT(*) FROM submissions) AS total_submissions,
                (SELECT COUNT(*) FROM dead_link_reports) AS dead_link_reports
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::submissions::tests::new_submission;
    use crate::db::{SubmissionRepository, test_pool};

    #[tokio::test]
    async fn test_dashboard_counts() {
        let pool = test_pool().await;
        SubmissionRepository::new(&pool)
            .create(&new_submission("Laden", None))
            .await
            .unwrap();

        let stats = StatsRepository::new(&pool).dashboard().await.unwrap();
        assert_eq!(stats.shops, 0);
        assert_eq!(stats.categories, 0);
        assert_eq!(stats.pending_submissions, 1);
        assert_eq!(stats.total_submissions, 1);
    }
}
