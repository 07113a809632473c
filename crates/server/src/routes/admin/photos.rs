//! Unsplash proxy for picking category cover photos.
//!
//! The access key stays on the server; the admin UI only sees the mapped
//! search results.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::extract::{JsonBody, QueryParam};
use crate::middleware::RequireAdmin;
use crate::response::{DataResponse, Outcome, ok};
use crate::services::PhotoSearchClient;
use crate::services::photos::PhotoSearchResults;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PhotoQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub download_location: Option<String>,
}

fn client(state: &AppState) -> Result<&PhotoSearchClient, AppError> {
    state
        .photos()
        .ok_or_else(|| AppError::Unavailable("Unsplash not configured".to_string()))
}

/// `GET /api/admin/unsplash/search?q=&page=`
#[instrument(skip(state, _admin))]
pub async fn search(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    QueryParam(query): QueryParam<PhotoQuery>,
) -> Result<DataResponse<PhotoSearchResults>, AppError> {
    let results = client(&state)?
        .search(&query.q, query.page.unwrap_or(1))
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Unsplash search failed");
            AppError::Upstream("Unsplash request failed".to_string())
        })?;
    Ok(DataResponse::new(results))
}

/// `POST /api/admin/unsplash/download`
///
/// Best effort: answers `ok: false` instead of failing when the ping cannot
/// be sent.
#[instrument(skip(state, _admin, body))]
pub async fn track_download(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    JsonBody(body): JsonBody<DownloadRequest>,
) -> Result<DataResponse<Outcome>, AppError> {
    let (Some(photos), Some(location)) = (state.photos(), body.download_location) else {
        return Ok(ok(false));
    };

    match photos.track_download(&location).await {
        Ok(tracked) => Ok(ok(tracked)),
        Err(e) => {
            tracing::warn!(error = %e, "Unsplash download tracking failed");
            Ok(ok(false))
        }
    }
}
