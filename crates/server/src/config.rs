//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional (with defaults)
//! - `DATABASE_URL` - SQLite database URL (default: `sqlite://deinshop.db`)
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `BASE_URL` - Public URL of this API; `https://` enables `Secure` cookies
//! - `SITE_URL` - Public site linked from notification emails (default: <https://dein.shop>)
//! - `CORS_ORIGINS` - Comma-separated list of allowed browser origins
//! - `IMAGE_PATH` - Directory for uploaded category images (default: ./uploads)
//! - `OUTBOUND_TIMEOUT_SECS` - Timeout for SMTP and photo search calls (default: 10)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//!
//! ## Optional (features)
//! - `IP_HASH_SALT` - Salt mixed into hashed reporter IPs (validated for strength)
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `EMAIL_FROM` -
//!   submission feedback emails; all of host, username and password must be set together
//! - `UNSPLASH_ACCESS_KEY` - Enables the admin photo search proxy
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://deinshop.db";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:5174";
const DEFAULT_FROM_ADDRESS: &str = "noreply@dein.shop";
const MIN_SALT_LENGTH: usize = 16;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// SQLite connection URL
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Public site URL, used for links in emails
    pub site_url: String,
    /// Browser origins allowed to call the API with credentials
    pub cors_origins: Vec<String>,
    /// Directory holding uploaded category images
    pub image_path: PathBuf,
    /// Salt for hashing reporter IPs on dead-link reports
    pub ip_hash_salt: Option<SecretString>,
    /// SMTP delivery (notifications are dropped with a warning when absent)
    pub email: Option<EmailConfig>,
    /// Photo search proxy (endpoints answer 503 when absent)
    pub photo_search: Option<PhotoSearchConfig>,
    /// Upper bound for any single outbound call
    pub outbound_timeout: Duration,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
    /// Emit JSON logs instead of human-readable text
    pub log_json: bool,
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

/// Unsplash photo search configuration.
#[derive(Clone)]
pub struct PhotoSearchConfig {
    pub access_key: SecretString,
}

impl std::fmt::Debug for PhotoSearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoSearchConfig")
            .field("access_key", &"[REDACTED]")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed, if SMTP settings are
    /// only partially present, or if `IP_HASH_SALT` fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url =
            SecretString::from(get_env_or_default("DATABASE_URL", DEFAULT_DATABASE_URL));
        let host: IpAddr = parse_env("HOST", "127.0.0.1")?;
        let port: u16 = parse_env("PORT", "3000")?;
        let base_url = get_env_or_default("BASE_URL", &format!("http://localhost:{port}"));
        let site_url = get_env_or_default("SITE_URL", "https://dein.shop");
        let cors_origins = parse_cors_origins(&get_env_or_default(
            "CORS_ORIGINS",
            DEFAULT_CORS_ORIGINS,
        ))?;
        let image_path = PathBuf::from(get_env_or_default("IMAGE_PATH", "./uploads"));

        let ip_hash_salt = get_optional_env("IP_HASH_SALT")
            .map(|salt| {
                validate_salt(&salt, "IP_HASH_SALT")?;
                Ok::<_, ConfigError>(SecretString::from(salt))
            })
            .transpose()?;

        let outbound_timeout = Duration::from_secs(parse_env("OUTBOUND_TIMEOUT_SECS", "10")?);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            site_url,
            cors_origins,
            image_path,
            ip_hash_salt,
            email: EmailConfig::from_env()?,
            photo_search: PhotoSearchConfig::from_env(),
            outbound_timeout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.0),
            log_json: get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Session cookies carry `Secure` when the API is served over HTTPS.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl EmailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let host = get_optional_env("SMTP_HOST");
        let username = get_optional_env("SMTP_USERNAME");
        let password = get_optional_env("SMTP_PASSWORD");

        match (host, username, password) {
            (Some(smtp_host), Some(smtp_username), Some(password)) => {
                if let Err(e) = validate_secret_strength(&password, "SMTP_PASSWORD") {
                    tracing::warn!("SMTP_PASSWORD validation warning: {e}");
                }
                Ok(Some(Self {
                    smtp_host,
                    smtp_port: parse_env("SMTP_PORT", "587")?,
                    smtp_username,
                    smtp_password: SecretString::from(password),
                    from_address: get_env_or_default("EMAIL_FROM", DEFAULT_FROM_ADDRESS),
                }))
            }
            (None, None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "SMTP_*".to_string(),
                "SMTP_HOST, SMTP_USERNAME and SMTP_PASSWORD must be set together".to_string(),
            )),
        }
    }
}

impl PhotoSearchConfig {
    fn from_env() -> Option<Self> {
        get_optional_env("UNSPLASH_ACCESS_KEY").map(|key| {
            if let Err(e) = validate_secret_strength(&key, "UNSPLASH_ACCESS_KEY") {
                tracing::warn!("UNSPLASH_ACCESS_KEY validation warning: {e}");
            }
            Self {
                access_key: SecretString::from(key),
            }
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_cors_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map(|_| origin.to_string())
                .map_err(|e| ConfigError::InvalidEnvVar("CORS_ORIGINS".to_string(), e.to_string()))
        })
        .collect()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// A salt must be long enough to resist precomputed IP tables.
fn validate_salt(salt: &str, var_name: &str) -> Result<(), ConfigError> {
    if salt.chars().count() < MIN_SALT_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {MIN_SALT_LENGTH} characters"),
        ));
    }
    validate_secret_strength(salt, var_name)
}
