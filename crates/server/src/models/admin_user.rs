//! Admin user domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use deinshop_core::{AdminUserId, Email};

/// An admin account.
///
/// The password hash is never serialized and is redacted from `Debug`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: AdminUserId,
    pub username: String,
    pub email: Email,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Owners may manage other admin accounts.
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AdminUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("is_owner", &self.is_owner)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("last_login_at", &self.last_login_at)
            .finish()
    }
}

/// Identity returned by setup and `GET /me`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: AdminUserId,
    pub username: String,
    pub email: Email,
    pub is_owner: bool,
}

impl From<AdminUser> for AdminProfile {
    fn from(user: AdminUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_owner: user.is_owner,
        }
    }
}
