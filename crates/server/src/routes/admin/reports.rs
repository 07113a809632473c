//! Dead-link report overview.

use axum::extract::State;
use tracing::instrument;

use crate::db::DeadLinkReportRepository;
use crate::db::dead_link_reports::DeadLinkSummary;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// `GET /api/admin/dead-link-reports`
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<DataResponse<Vec<DeadLinkSummary>>, AppError> {
    let reports = DeadLinkReportRepository::new(state.pool()).summary().await?;
    Ok(DataResponse::new(reports))
}
