//! Moderation queue handlers.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use deinshop_core::{ReviewOutcome, SubmissionId, SubmissionStatus};

use crate::db::SubmissionRepository;
use crate::error::AppError;
use crate::extract::{JsonBody, PathParam, QueryParam};
use crate::middleware::RequireAdmin;
use crate::models::Submission;
use crate::response::DataResponse;
use crate::services::{ReviewDecision, ReviewService};
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct SubmissionFilter {
    pub status: Option<String>,
}

impl SubmissionFilter {
    fn status(&self) -> Result<Option<SubmissionStatus>, AppError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => SubmissionStatus::parse(raw).map(Some).ok_or_else(|| {
                AppError::BadRequest(
                    "status must be one of pending, approved, rejected".to_string(),
                )
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub status: String,
    pub admin_note: Option<String>,
    #[serde(default)]
    pub send_feedback: bool,
}

impl ReviewRequest {
    fn validate(self) -> Result<ReviewDecision, AppError> {
        let outcome = match self.status.as_str() {
            "approved" => ReviewOutcome::Approved,
            "rejected" => ReviewOutcome::Rejected,
            _ => {
                return Err(AppError::BadRequest(
                    "status must be approved or rejected".to_string(),
                ));
            }
        };
        let admin_note = validation::non_blank(self.admin_note);
        validation::max_length("adminNote", admin_note.as_deref(), 500)?;

        Ok(ReviewDecision {
            outcome,
            admin_note,
            send_feedback: self.send_feedback,
        })
    }
}

/// `GET /api/admin/submissions?status=`
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    QueryParam(filter): QueryParam<SubmissionFilter>,
) -> Result<DataResponse<Vec<Submission>>, AppError> {
    let submissions = SubmissionRepository::new(state.pool())
        .list(filter.status()?)
        .await?;
    Ok(DataResponse::new(submissions))
}

/// `PATCH /api/admin/submissions/{id}`
///
/// A submission can be reviewed once; repeating the request answers 409 and
/// sends nothing.
#[instrument(skip(state, admin, body), fields(admin_user_id = %admin.id))]
pub async fn review(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<i64>,
    JsonBody(body): JsonBody<ReviewRequest>,
) -> Result<DataResponse<Submission>, AppError> {
    let decision = body.validate()?;
    let submission = ReviewService::new(state.pool(), state.notifier())
        .review(SubmissionId::new(id), admin.id, decision)
        .await?;
    Ok(DataResponse::new(submission))
}
