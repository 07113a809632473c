//! Unified error handling for the HTTP layer.
//!
//! Every failure leaves the server as `{"error": {"message": "..."}}` with a
//! matching status code. Server-side failures are reported to Sentry and
//! logged, and their details never reach the client.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::{MultipartError, MultipartRejection},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::{ImageError, ReviewError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[source] RepositoryError),

    /// Malformed or missing input.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing, unknown or expired session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Write refused because of the current state of the data.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests")]
    RateLimited { retry_after_secs: u64 },

    /// An external dependency answered with an error.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// An optional integration is not configured.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// The message shown to clients.
    #[must_use]
    pub fn public_message(&self) -> &str {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error",
            Self::RateLimited { .. } => "Too many requests",
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::Upstream(msg)
            | Self::Unavailable(msg) => msg,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request failed"
            );
        } else if matches!(self, Self::Upstream(_)) {
            tracing::warn!(error = %self, "Upstream dependency failed");
        }

        let status = self.status();
        let body = Json(ErrorEnvelope {
            error: ErrorBody {
                message: self.public_message(),
            },
        });
        let mut response = (status, body).into_response();

        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("Not found".to_string()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Database(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials".to_string()),
            AuthError::MissingSession => Self::Unauthorized("Unauthorized".to_string()),
            AuthError::SessionExpired => Self::Unauthorized("Session expired".to_string()),
            AuthError::SetupCompleted => Self::Forbidden("Setup already completed".to_string()),
            AuthError::UserAlreadyExists => {
                Self::Conflict("Username or email already exists".to_string())
            }
            AuthError::Repository(e) => e.into(),
            AuthError::PasswordHash(msg) => Self::Internal(msg),
        }
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::NotFound => Self::NotFound("Submission not found".to_string()),
            ReviewError::AlreadyReviewed => {
                Self::Conflict("Submission already reviewed".to_string())
            }
            ReviewError::Repository(e) => e.into(),
        }
    }
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Empty => Self::BadRequest("No image file provided".to_string()),
            ImageError::UnsupportedType => {
                Self::BadRequest("Only JPEG, PNG or WebP allowed".to_string())
            }
            ImageError::TooLarge => Self::BadRequest("File too large (max 5 MB)".to_string()),
            ImageError::Io(e) => Self::Internal(format!("image storage: {e}")),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::BadRequest("File too large (max 5 MB)".to_string())
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

/// Set the Sentry user context from an admin user ID.
pub fn set_sentry_user(admin_user_id: i64) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_user_id.to_string()),
            ..Default::default()
        }));
    });
}
