//! Session types for admin authentication.

use chrono::{DateTime, Utc};

use deinshop_core::AdminUserId;

/// A stored login session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque random token, also the cookie value.
    pub id: String,
    pub admin_user_id: AdminUserId,
    pub is_owner: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A session is expired once its expiry lies strictly in the past.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// The authenticated admin attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentAdmin {
    pub id: AdminUserId,
    pub is_owner: bool,
}

impl From<&Session> for CurrentAdmin {
    fn from(session: &Session) -> Self {
        Self {
            id: session.admin_user_id,
            is_owner: session.is_owner,
        }
    }
}
