//! Admin setup, login and session endpoints.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use deinshop_core::Email;

use crate::db::AdminUserRepository;
use crate::error::AppError;
use crate::extract::JsonBody;
use crate::middleware::{RequireAdmin, removal_cookie, session_cookie, session_token};
use crate::models::{AdminProfile, AdminUser};
use crate::response::{DataResponse, Message, message};
use crate::services::auth::{AuthService, LoginSession, MIN_PASSWORD_LENGTH};
use crate::state::AppState;
use crate::validation;

use super::SetCookie;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatus {
    pub needs_setup: bool,
}

/// Credentials for a new admin account (setup and owner-created users).
#[derive(Deserialize)]
pub struct NewAdminRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A validated [`NewAdminRequest`].
pub struct NewAdmin {
    pub username: String,
    pub email: Email,
    pub password: String,
}

impl NewAdminRequest {
    pub(crate) fn validate(self) -> Result<NewAdmin, AppError> {
        let username = self.username.trim().to_owned();
        validation::length("username", &username, 3, 50)?;
        let email = validation::email("email", &self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::BadRequest(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(NewAdmin {
            username,
            email,
            password: self.password,
        })
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn with_session_cookie(state: &AppState, session: &LoginSession) -> SetCookie {
    let cookie = session_cookie(session.token.clone(), state.config().secure_cookies());
    [(SET_COOKIE, cookie.to_string())]
}

/// `GET /api/admin/setup`
#[instrument(skip(state))]
pub async fn setup_status(
    State(state): State<AppState>,
) -> Result<DataResponse<SetupStatus>, AppError> {
    let needs_setup = AuthService::new(state.pool()).needs_setup().await?;
    Ok(DataResponse::new(SetupStatus { needs_setup }))
}

/// `POST /api/admin/setup`
///
/// Creates the first admin as owner and logs them in. Refused with 403 once
/// any admin exists.
#[instrument(skip(state, body))]
pub async fn setup(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewAdminRequest>,
) -> Result<(StatusCode, SetCookie, DataResponse<AdminProfile>), AppError> {
    let admin = body.validate()?;
    let auth = AuthService::new(state.pool());
    if !auth.needs_setup().await? {
        return Err(AppError::Forbidden("Setup already completed".to_string()));
    }

    let session = auth
        .setup(&admin.username, &admin.email, admin.password)
        .await?;
    let cookie = with_session_cookie(&state, &session);

    Ok((
        StatusCode::CREATED,
        cookie,
        DataResponse::new(AdminProfile::from(session.admin)),
    ))
}

/// `POST /api/admin/login`
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<(SetCookie, DataResponse<AdminProfile>), AppError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "username and password are required".to_string(),
        ));
    }

    let session = AuthService::new(state.pool())
        .login(body.username.trim(), body.password)
        .await?;
    tracing::info!(admin_user_id = %session.admin.id, "Admin logged in");
    let cookie = with_session_cookie(&state, &session);

    Ok((cookie, DataResponse::new(AdminProfile::from(session.admin))))
}

/// `POST /api/admin/logout`
#[instrument(skip(state, admin, headers))]
pub async fn logout(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    headers: HeaderMap,
) -> Result<(SetCookie, DataResponse<Message>), AppError> {
    if let Some(token) = session_token(&headers) {
        AuthService::new(state.pool()).logout(&token).await?;
    }
    tracing::info!(admin_user_id = %admin.id, "Admin logged out");

    let cookie = removal_cookie(state.config().secure_cookies());
    Ok(([(SET_COOKIE, cookie.to_string())], message("Logged out")))
}

/// `GET /api/admin/me`
#[instrument(skip(state, admin))]
pub async fn me(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<DataResponse<AdminUser>, AppError> {
    let user = AdminUserRepository::new(state.pool())
        .get_by_id(admin.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;
    Ok(DataResponse::new(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> NewAdminRequest {
        NewAdminRequest {
            username: username.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        }
    }

    #[test]
    fn test_new_admin_validation() {
        assert!(request("admin", "a@b.com", "longenough1").validate().is_ok());
        assert!(request("ab", "a@b.com", "longenough1").validate().is_err());
        assert!(request(&"a".repeat(51), "a@b.com", "longenough1").validate().is_err());
        assert!(request("admin", "not-an-email", "longenough1").validate().is_err());
        assert!(request("admin", "a@b.com", "short").validate().is_err());
    }
}
