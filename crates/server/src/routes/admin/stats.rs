//! Dashboard statistics.

use axum::extract::State;
use tracing::instrument;

use crate::db::StatsRepository;
use crate::db::stats::DashboardStats;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// `GET /api/admin/stats`
#[instrument(skip(state, _admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<DataResponse<DashboardStats>, AppError> {
    let stats = StatsRepository::new(state.pool()).dashboard().await?;
    Ok(DataResponse::new(stats))
}
