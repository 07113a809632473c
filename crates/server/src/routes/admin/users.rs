//! Admin account management, restricted to owners.

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use deinshop_core::{AdminUserId, Email};

use crate::db::{AdminUserRepository, RepositoryError};
use crate::error::AppError;
use crate::extract::{JsonBody, PathParam};
use crate::middleware::RequireOwner;
use crate::models::AdminUser;
use crate::response::{DataResponse, Message, message};
use crate::services::AuthService;
use crate::state::AppState;

use super::auth::NewAdminRequest;

/// Response to a successful account creation.
#[derive(Debug, Serialize)]
pub struct CreatedAdmin {
    pub id: AdminUserId,
    pub username: String,
    pub email: Email,
}

/// `GET /api/admin/users`
#[instrument(skip(state, _owner))]
pub async fn index(
    State(state): State<AppState>,
    RequireOwner(_owner): RequireOwner,
) -> Result<DataResponse<Vec<AdminUser>>, AppError> {
    let users = AdminUserRepository::new(state.pool()).list_all().await?;
    Ok(DataResponse::new(users))
}

/// `POST /api/admin/users`
///
/// New accounts are never owners.
#[instrument(skip(state, owner, body), fields(admin_user_id = %owner.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireOwner(owner): RequireOwner,
    JsonBody(body): JsonBody<NewAdminRequest>,
) -> Result<(StatusCode, DataResponse<CreatedAdmin>), AppError> {
    let admin = body.validate()?;
    let user = AuthService::new(state.pool())
        .create_admin(&admin.username, &admin.email, admin.password, false)
        .await?;

    tracing::info!(created_admin_id = %user.id, "Admin user created");
    Ok((
        StatusCode::CREATED,
        DataResponse::new(CreatedAdmin {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
    ))
}

/// `DELETE /api/admin/users/{id}`
///
/// Also ends every session of the deleted account.
#[instrument(skip(state, owner), fields(admin_user_id = %owner.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireOwner(owner): RequireOwner,
    PathParam(id): PathParam<i64>,
) -> Result<DataResponse<Message>, AppError> {
    let id = AdminUserId::new(id);
    if id == owner.id {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    AdminUserRepository::new(state.pool())
        .delete_with_sessions(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("User not found".to_string()),
            other => other.into(),
        })?;

    tracing::info!(deleted_admin_id = %id, "Admin user deleted");
    Ok(message("User deleted"))
}
