//! Submission repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use deinshop_core::{
    AdminUserId, CategoryId, Email, ReviewOutcome, SubmissionId, SubmissionStatus,
};

use super::RepositoryError;
use crate::models::{NewSubmission, Submission};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SubmissionRow {
    id: SubmissionId,
    shop_name: String,
    shop_url: String,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    category_suggestion: Option<String>,
    region: String,
    pickup: String,
    shipping: String,
    description: String,
    submitter_email: Option<String>,
    submitter_note: Option<String>,
    status: String,
    admin_note: Option<String>,
    feedback_sent: bool,
    reviewed_by: Option<AdminUserId>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = RepositoryError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let status = SubmissionStatus::parse(&row.status).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("invalid submission status: {}", row.status))
        })?;
        let submitter_email = row
            .submitter_email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: row.id,
            shop_name: row.shop_name,
            shop_url: row.shop_url,
            category_id: row.category_id,
            category_name: row.category_name,
            category_suggestion: row.category_suggestion,
            region: row.region,
            pickup: row.pickup,
            shipping: row.shipping,
            description: row.description,
            submitter_email,
            submitter_note: row.submitter_note,
            status,
            admin_note: row.admin_note,
            feedback_sent: row.feedback_sent,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for submission database operations.
pub struct SubmissionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SubmissionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new pending submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[tracing::instrument(skip(self, submission), fields(shop_name = %submission.shop_name))]
    pub async fn create(&self, submission: &NewSubmission) -> Result<SubmissionId, RepositoryError> {
        let now = Utc::now();
        let id: SubmissionId = sqlx::query_scalar(
            r"
            INSERT INTO submissions (shop_name, shop_url, category_id, category_suggestion,
                                     region, pickup, shipping, description,
                                     submitter_email, submitter_note, status,
                                     created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)
            RETURNING id
            ",
        )
        .bind(&submission.shop_name)
        .bind(&submission.shop_url)
        .bind(submission.category_id)
        .bind(&submission.category_suggestion)
        .bind(&submission.region)
        .bind(&submission.pickup)
        .bind(&submission.shipping)
        .bind(&submission.description)
        .bind(submission.submitter_email.as_ref().map(Email::as_str))
        .bind(&submission.submitter_note)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(submission_id = %id, "Submission received");
        Ok(id)
    }

    /// List submissions newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row holds invalid data.
    pub async fn list(
        &self,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<Submission>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r"
            SELECT sub.id, sub.shop_name, sub.shop_url, sub.category_id,
                   c.name AS category_name, sub.category_suggestion,
                   sub.region, sub.pickup, sub.shipping, sub.description,
                   sub.submitter_email, sub.submitter_note, sub.status, sub.admin_note,
                   sub.feedback_sent, sub.reviewed_by, sub.reviewed_at,
                   sub.created_at, sub.updated_at
            FROM submissions sub
            LEFT JOIN categories c ON c.id = sub.category_id
            WHERE ?1 IS NULL OR sub.status = ?1
            ORDER BY sub.created_at DESC, sub.id DESC
            ",
        )
        .bind(status.map(SubmissionStatus::as_str))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row holds invalid data.
    pub async fn get_by_id(&self, id: SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r"
            SELECT sub.id, sub.shop_name, sub.shop_url, sub.category_id,
                   c.name AS category_name, sub.category_suggestion,
                   sub.region, sub.pickup, sub.shipping, sub.description,
                   sub.submitter_email, sub.submitter_note, sub.status, sub.admin_note,
                   sub.feedback_sent, sub.reviewed_by, sub.reviewed_at,
                   sub.created_at, sub.updated_at
            FROM submissions sub
            LEFT JOIN categories c ON c.id = sub.category_id
            WHERE sub.id = ?
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Record a review decision on a pending submission.
    ///
    /// The update only applies while the submission is still `pending`, so a
    /// submission is reviewed at most once even under concurrent requests.
    /// Returns `Ok(false)` when no pending submission with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[tracing::instrument(skip(self, admin_note), fields(submission_id = %id, outcome = ?outcome))]
    pub async fn review(
        &self,
        id: SubmissionId,
        outcome: ReviewOutcome,
        admin_note: Option<&str>,
        reviewer: AdminUserId,
    ) -> Result<bool, RepositoryError> {
        let now = Utc::now();
        let status = SubmissionStatus::from(outcome);
        let result = sqlx::query(
            r"
            UPDATE submissions
            SET status = ?, admin_note = ?, reviewed_by = ?, reviewed_at = ?, updated_at = ?
            WHERE id = ? AND status = 'pending'
            ",
        )
        .bind(status.as_str())
        .bind(admin_note)
        .bind(reviewer)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Flag that the submitter has been notified about the review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_feedback_sent(&self, id: SubmissionId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE submissions SET feedback_sent = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
