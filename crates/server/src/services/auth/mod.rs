//! Authentication service.
//!
//! Password login backed by server-side sessions. A session is an opaque
//! random token stored in the `sessions` table and carried in the `session`
//! cookie. Expiry is checked on every use; there is no sliding renewal.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use deinshop_core::Email;

use crate::db::{AdminUserRepository, RepositoryError, SessionRepository};
use crate::models::{AdminUser, CurrentAdmin};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// How long a session stays valid after login.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Hash checked when the username is unknown, so both failure paths cost
/// one argon2 verification.
static UNKNOWN_USER_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("unknown-user-placeholder").unwrap_or_default());

/// A freshly created session for a logged-in admin.
#[derive(Debug)]
pub struct LoginSession {
    pub admin: AdminUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: AdminUserRepository<'a>,
    sessions: SessionRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: AdminUserRepository::new(pool),
            sessions: SessionRepository::new(pool),
        }
    }

    /// Whether the one-time setup is still open.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the count query fails.
    pub async fn needs_setup(&self) -> Result<bool, AuthError> {
        Ok(self.users.count().await? == 0)
    }

    /// Create the first admin as owner and log them in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SetupCompleted` if any admin already exists.
    pub async fn setup(
        &self,
        username: &str,
        email: &Email,
        password: String,
    ) -> Result<LoginSession, AuthError> {
        let password_hash = hash_password_blocking(password).await?;

        let admin = self
            .users
            .create_first_owner(username, email, &password_hash)
            .await?
            .ok_or(AuthError::SetupCompleted)?;

        tracing::info!(admin_user_id = %admin.id, "Initial owner account created");
        self.start_session(admin).await
    }

    /// Verify username and password, then open a new session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username or password is wrong.
    pub async fn login(&self, username: &str, password: String) -> Result<LoginSession, AuthError> {
        let Some(admin) = self.users.get_by_username(username).await? else {
            tokio::task::spawn_blocking(move || verify_password(&password, &UNKNOWN_USER_HASH))
                .await
                .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password_blocking(password, admin.password_hash.clone()).await? {
            return Err(AuthError::InvalidCredentials);
        }

        self.users.touch_last_login(admin.id).await?;
        self.start_session(admin).await
    }

    /// Drop a session. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the delete fails.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete(token).await?;
        Ok(())
    }

    /// Resolve a session token to the admin it belongs to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` if the token is unknown or expired.
    pub async fn authenticate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<CurrentAdmin, AuthError> {
        let session = self
            .sessions
            .find(token)
            .await?
            .ok_or(AuthError::SessionExpired)?;

        if session.is_expired_at(now) {
            return Err(AuthError::SessionExpired);
        }

        Ok(CurrentAdmin::from(&session))
    }

    /// Create an additional admin account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the username or email is taken.
    pub async fn create_admin(
        &self,
        username: &str,
        email: &Email,
        password: String,
        is_owner: bool,
    ) -> Result<AdminUser, AuthError> {
        let password_hash = hash_password_blocking(password).await?;

        self.users
            .create(username, email, &password_hash, is_owner)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    async fn start_session(&self, admin: AdminUser) -> Result<LoginSession, AuthError> {
        let token = generate_session_token();
        let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
        self.sessions.create(&token, admin.id, expires_at).await?;

        Ok(LoginSession {
            admin,
            token,
            expires_at,
        })
    }
}

/// Generate an unguessable session token (256 bits, URL-safe base64).
#[must_use]
pub fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored hash. Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
}

async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("longenough1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("longenough1", &hash));
        assert!(!verify_password("wrong-password", &hash));
        assert!(!verify_password("longenough1", "not-a-hash"));
    }

    #[test]
    fn test_session_tokens_are_unique_and_url_safe() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn test_setup_login_and_authenticate() {
        let pool = test_pool().await;
        let auth = AuthService::new(&pool);
        let email = Email::parse("a@b.com").unwrap();

        assert!(auth.needs_setup().await.unwrap());
        let setup = auth
            .setup("admin", &email, "longenough1".to_owned())
            .await
            .unwrap();
        assert!(setup.admin.is_owner);
        assert!(!auth.needs_setup().await.unwrap());

        let again = auth.setup("other", &email, "longenough1".to_owned()).await;
        assert!(matches!(again, Err(AuthError::SetupCompleted)));

        let login = auth.login("admin", "longenough1".to_owned()).await.unwrap();
        let current = auth.authenticate(&login.token, Utc::now()).await.unwrap();
        assert_eq!(current.id, setup.admin.id);
        assert!(current.is_owner);

        let expired = auth
            .authenticate(&login.token, login.expires_at + Duration::seconds(1))
            .await;
        assert!(matches!(expired, Err(AuthError::SessionExpired)));

        auth.logout(&login.token).await.unwrap();
        let gone = auth.authenticate(&login.token, Utc::now()).await;
        assert!(matches!(gone, Err(AuthError::SessionExpired)));
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_unknown_user() {
        let pool = test_pool().await;
        let auth = AuthService::new(&pool);
        auth.setup("admin", &Email::parse("a@b.com").unwrap(), "longenough1".to_owned())
            .await
            .unwrap();

        let wrong = auth.login("admin", "nope-nope".to_owned()).await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        let unknown = auth.login("ghost", "longenough1".to_owned()).await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_user_costs_a_password_check() {
        let pool = test_pool().await;
        let auth = AuthService::new(&pool);
        auth.setup("admin", &Email::parse("a@b.com").unwrap(), "longenough1".to_owned())
            .await
            .unwrap();
        // First use builds the placeholder hash.
        let _ = auth.login("ghost", "longenough1".to_owned()).await;

        let started = std::time::Instant::now();
        let wrong = auth.login("admin", "nope-nope".to_owned()).await;
        let wrong_password = started.elapsed();

        let started = std::time::Instant::now();
        let unknown = auth.login("ghost", "nope-nope".to_owned()).await;
        let unknown_user = started.elapsed();

        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(
            unknown_user * 4 >= wrong_password,
            "unknown user {unknown_user:?} vs wrong password {wrong_password:?}"
        );
    }
}
