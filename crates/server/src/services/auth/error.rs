//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown username.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No session cookie was presented.
    #[error("missing session")]
    MissingSession,

    /// Session unknown or past its expiry.
    #[error("session expired")]
    SessionExpired,

    /// An admin already exists, so setup is closed.
    #[error("setup already completed")]
    SetupCompleted,

    /// Username or email already taken.
    #[error("admin user already exists")]
    UserAlreadyExists,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}
