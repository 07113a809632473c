//! Session authentication extractors and cookie helpers.
//!
//! The session token travels in an HTTP-only, strict same-site cookie. Every
//! admin route takes [`RequireAdmin`] or [`RequireOwner`], which look the
//! token up and check its expiry on each request.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::COOKIE, request::Parts},
};
use chrono::Utc;
use cookie::{Cookie, SameSite};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentAdmin;
use crate::services::auth::{AuthError, AuthService, SESSION_TTL_HOURS};
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Build the cookie carrying a freshly issued session token.
#[must_use]
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(cookie::time::Duration::hours(SESSION_TTL_HOURS))
        .build()
}

/// Build a cookie that clears the session cookie in the browser.
#[must_use]
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = session_cookie(String::new(), secure);
    cookie.make_removal();
    cookie
}

/// Read the session token from the request's `Cookie` headers.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentAdmin, AppError> {
    let token = session_token(&parts.headers).ok_or(AuthError::MissingSession)?;
    let admin = AuthService::new(state.pool())
        .authenticate(&token, Utc::now())
        .await?;

    set_sentry_user(admin.id.as_i64());
    tracing::Span::current().record("admin_user_id", admin.id.as_i64());
    Ok(admin)
}

/// Extractor that requires a valid admin session.
///
/// Rejects with 401 when the cookie is missing, unknown or expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, admin {}!", admin.id)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await.map(Self)
    }
}

/// Extractor that requires a valid session belonging to an owner.
///
/// Rejects with 401 like [`RequireAdmin`], and with 403 for non-owners.
pub struct RequireOwner(pub CurrentAdmin);

impl FromRequestParts<AppState> for RequireOwner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let admin = authenticate(parts, state).await?;
        if !admin.is_owner {
            tracing::warn!(admin_user_id = %admin.id, "Owner-only route refused");
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }
        Ok(Self(admin))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with_cookies(values: &[&'static str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(COOKIE, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok".to_owned(), true).to_string();
        assert!(cookie.starts_with("session=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));

        assert!(!session_cookie("tok".to_owned(), false).to_string().contains("Secure"));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = removal_cookie(false).to_string();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_session_token_found_among_other_cookies() {
        let headers = headers_with_cookies(&["theme=dark; session=abc123", "lang=de"]);
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_session_token_missing_or_empty() {
        assert_eq!(session_token(&headers_with_cookies(&[])), None);
        assert_eq!(session_token(&headers_with_cookies(&["theme=dark"])), None);
        assert_eq!(session_token(&headers_with_cookies(&["session="])), None);
    }
}
