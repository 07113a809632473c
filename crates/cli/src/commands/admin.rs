//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! DS_ADMIN_PASSWORD=... ds-cli admin create -u jana -e jana@dein.shop --owner
//! ```
//!
//! Useful for recovering access when the only owner account is lost; the
//! web setup flow closes once any admin exists.

use secrecy::SecretString;
use thiserror::Error;

use deinshop_core::Email;
use deinshop_server::db;
use deinshop_server::services::auth::{AuthError, AuthService, MIN_PASSWORD_LENGTH};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid username: must be 3-50 characters")]
    InvalidUsername,

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    WeakPassword,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a new admin user and return its ID.
///
/// # Errors
///
/// Returns an error for invalid input, a taken username or email, or a
/// database failure.
pub async fn create_user(
    database_url: &SecretString,
    username: &str,
    email: &str,
    password: String,
    is_owner: bool,
) -> Result<i64, AdminError> {
    let username = username.trim();
    if !(3..=50).contains(&username.chars().count()) {
        return Err(AdminError::InvalidUsername);
    }
    let email = Email::parse(email.trim()).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(database_url).await?;

    let user = AuthService::new(&pool)
        .create_admin(username, &email, password, is_owner)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Username: {}, Owner: {}",
        user.id,
        user.username,
        user.is_owner
    );
    pool.close().await;
    Ok(user.id.as_i64())
}
