//! Dead-link report repository.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;

use deinshop_core::ShopId;

use super::RepositoryError;

/// Report count for one shop, as shown to admins.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeadLinkSummary {
    pub shop_id: ShopId,
    pub shop_name: String,
    pub shop_url: String,
    pub report_count: i64,
}

/// Repository for dead-link reports.
pub struct DeadLinkReportRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DeadLinkReportRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a report. A repeated report from the same hashed IP is ignored.
    ///
    /// Returns `true` when a new report was stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record(&self, shop_id: ShopId, ip_hash: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO dead_link_reports (shop_id, ip_hash, reported_at) VALUES (?, ?, ?)",
        )
        .bind(shop_id)
        .bind(ip_hash)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Report counts per shop, most reported first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary(&self) -> Result<Vec<DeadLinkSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, DeadLinkSummary>(
            r"
            SELECT s.id AS shop_id, s.name AS shop_name, s.url AS shop_url,
                   COUNT(r.id) AS report_count
            FROM dead_link_reports r
            JOIN shops s ON s.id = r.shop_id
            GROUP BY s.id, s.name, s.url
            ORDER BY report_count DESC, s.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
