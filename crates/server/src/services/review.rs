//! Submission review workflow.
//!
//! A submission moves from `pending` to `approved` or `rejected` exactly
//! once. The status change is a single conditional update; the optional
//! feedback email is handed to the [`Notifier`] afterwards and can never turn
//! a recorded decision into a failure.

use sqlx::SqlitePool;
use thiserror::Error;

use deinshop_core::{AdminUserId, ReviewOutcome, SubmissionId};

use super::notifier::{Notification, NotificationKind, Notifier};
use crate::db::{RepositoryError, SubmissionRepository};
use crate::models::Submission;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("submission not found")]
    NotFound,

    /// The submission already left `pending`.
    #[error("submission already reviewed")]
    AlreadyReviewed,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A moderation decision.
#[derive(Debug, Clone)]
pub struct ReviewDecision {
    pub outcome: ReviewOutcome,
    pub admin_note: Option<String>,
    /// Email the submitter about the outcome, if they left an address.
    pub send_feedback: bool,
}

pub struct ReviewService<'a> {
    submissions: SubmissionRepository<'a>,
    notifier: &'a dyn Notifier,
}

impl<'a> ReviewService<'a> {
    #[must_use]
    pub fn new(pool: &'a SqlitePool, notifier: &'a dyn Notifier) -> Self {
        Self {
            submissions: SubmissionRepository::new(pool),
            notifier,
        }
    }

    /// Apply a review decision and optionally notify the submitter.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotFound` if the submission does not exist.
    /// Returns `ReviewError::AlreadyReviewed` if it is no longer pending.
    #[tracing::instrument(skip(self, decision), fields(outcome = ?decision.outcome))]
    pub async fn review(
        &self,
        id: SubmissionId,
        reviewer: AdminUserId,
        decision: ReviewDecision,
    ) -> Result<Submission, ReviewError> {
        let applied = self
            .submissions
            .review(id, decision.outcome, decision.admin_note.as_deref(), reviewer)
            .await?;

        if !applied {
            return match self.submissions.get_by_id(id).await? {
                None => Err(ReviewError::NotFound),
                Some(_) => Err(ReviewError::AlreadyReviewed),
            };
        }

        let mut submission = self
            .submissions
            .get_by_id(id)
            .await?
            .ok_or(ReviewError::NotFound)?;

        tracing::info!(
            submission_id = %id,
            reviewer = %reviewer,
            status = %submission.status,
            "Submission reviewed"
        );

        if submission.wants_feedback(decision.send_feedback)
            && let Some(recipient) = submission.submitter_email.clone()
        {
            let kind = match decision.outcome {
                ReviewOutcome::Approved => NotificationKind::SubmissionApproved,
                ReviewOutcome::Rejected => NotificationKind::SubmissionRejected,
            };
            let accepted = self.notifier.notify(Notification {
                kind,
                recipient,
                shop_name: submission.shop_name.clone(),
                admin_note: submission.admin_note.clone(),
            });
            if !accepted {
                tracing::warn!(submission_id = %id, "Feedback notification was not accepted");
            }

            // Set after any dispatch attempt, delivered or not.
            self.submissions.mark_feedback_sent(id).await?;
            submission.feedback_sent = true;
        }

        Ok(submission)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use deinshop_core::SubmissionStatus;

    use super::*;
    use crate::db::submissions::tests::{new_submission, seed_admin};
    use crate::db::test_pool;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
        accept: bool,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) -> bool {
            self.sent.lock().unwrap().push(notification);
            self.accept
        }
    }

    fn reject(send_feedback: bool) -> ReviewDecision {
        ReviewDecision {
            outcome: ReviewOutcome::Rejected,
            admin_note: Some("duplicate".to_owned()),
            send_feedback,
        }
    }

    #[tokio::test]
    async fn test_rejection_sends_one_email_and_marks_feedback() {
        let pool = test_pool().await;
        let admin = seed_admin(&pool).await;
        let id = SubmissionRepository::new(&pool)
            .create(&new_submission("Laden", Some("fan@example.org")))
            .await
            .unwrap();
        let notifier = RecordingNotifier {
            accept: true,
            ..Default::default()
        };
        let service = ReviewService::new(&pool, &notifier);

        let reviewed = service.review(id, admin, reject(true)).await.unwrap();
        assert_eq!(reviewed.status, SubmissionStatus::Rejected);
        assert!(reviewed.feedback_sent);

        let again = service.review(id, admin, reject(true)).await;
        assert!(matches!(again, Err(ReviewError::AlreadyReviewed)));

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::SubmissionRejected);
        assert_eq!(sent[0].admin_note.as_deref(), Some("duplicate"));
    }

    #[tokio::test]
    async fn test_failed_dispatch_still_marks_feedback_sent() {
        let pool = test_pool().await;
        let admin = seed_admin(&pool).await;
        let id = SubmissionRepository::new(&pool)
            .create(&new_submission("Laden", Some("fan@example.org")))
            .await
            .unwrap();
        let notifier = RecordingNotifier::default();

        let reviewed = ReviewService::new(&pool, &notifier)
            .review(id, admin, reject(true))
            .await
            .unwrap();
        assert!(reviewed.feedback_sent);
    }

    #[tokio::test]
    async fn test_no_email_without_address_or_request() {
        let pool = test_pool().await;
        let admin = seed_admin(&pool).await;
        let repo = SubmissionRepository::new(&pool);
        let anonymous = repo.create(&new_submission("Anonym", None)).await.unwrap();
        let quiet = repo
            .create(&new_submission("Leise", Some("fan@example.org")))
            .await
            .unwrap();
        let notifier = RecordingNotifier {
            accept: true,
            ..Default::default()
        };
        let service = ReviewService::new(&pool, &notifier);

        let a = service.review(anonymous, admin, reject(true)).await.unwrap();
        let q = service.review(quiet, admin, reject(false)).await.unwrap();

        assert!(!a.feedback_sent);
        assert!(!q.feedback_sent);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_submission_is_not_found() {
        let pool = test_pool().await;
        let admin = seed_admin(&pool).await;
        let notifier = RecordingNotifier::default();
        let result = ReviewService::new(&pool, &notifier)
            .review(SubmissionId::new(404), admin, reject(false))
            .await;
        assert!(matches!(result, Err(ReviewError::NotFound)));
    }
}
