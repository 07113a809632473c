//! Community submission domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use deinshop_core::{AdminUserId, CategoryId, Email, SubmissionId, SubmissionStatus};

/// A shop proposed by a visitor, awaiting or past moderation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub shop_name: String,
    pub shop_url: String,
    pub category_id: Option<CategoryId>,
    /// Name of the referenced category, when it still exists.
    pub category_name: Option<String>,
    pub category_suggestion: Option<String>,
    pub region: String,
    pub pickup: String,
    pub shipping: String,
    pub description: String,
    pub submitter_email: Option<Email>,
    pub submitter_note: Option<String>,
    pub status: SubmissionStatus,
    pub admin_note: Option<String>,
    pub feedback_sent: bool,
    pub reviewed_by: Option<AdminUserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated public submission ready to be stored.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub shop_name: String,
    pub shop_url: String,
    pub category_id: Option<CategoryId>,
    pub category_suggestion: Option<String>,
    pub region: String,
    pub pickup: String,
    pub shipping: String,
    pub description: String,
    pub submitter_email: Option<Email>,
    pub submitter_note: Option<String>,
}

impl Submission {
    /// Whether a feedback notification should go out for this submission.
    #[must_use]
    pub const fn wants_feedback(&self, requested: bool) -> bool {
        requested && self.submitter_email.is_some() && !self.feedback_sent
    }
}
