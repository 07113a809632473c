//! Input validation helpers for request bodies.
//!
//! Every check fails with [`AppError::BadRequest`] naming the offending field,
//! so handlers can validate a whole body with `?` before touching the database.

use serde::{Deserialize, Deserializer};
use url::Url;

use deinshop_core::{Email, Slug};

use crate::error::AppError;
use crate::models::category::uploaded_file_name;

/// Require `value` to be between `min` and `max` characters long.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the length is out of range.
pub fn length(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < min {
        return Err(if min == 1 {
            AppError::BadRequest(format!("{field} is required"))
        } else {
            AppError::BadRequest(format!("{field} must be at least {min} characters"))
        });
    }
    if len > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Like [`length`] with no lower bound, skipping absent values.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the value is too long.
pub fn max_length(field: &str, value: Option<&str>, max: usize) -> Result<(), AppError> {
    value.map_or(Ok(()), |v| length(field, v, 0, max))
}

/// Require an absolute `http` or `https` URL.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the value is not such a URL.
pub fn http_url(field: &str, value: &str) -> Result<(), AppError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(AppError::BadRequest(format!("{field} must be a valid URL"))),
    }
}

/// Require an `http(s)` URL or a reference to an uploaded file.
///
/// # Errors
///
/// Returns `AppError::BadRequest` otherwise.
pub fn image_url(field: &str, value: &str) -> Result<(), AppError> {
    if uploaded_file_name(value).is_some() {
        return Ok(());
    }
    http_url(field, value)
}

/// # Errors
///
/// Returns `AppError::BadRequest` if the value is not a valid email address.
pub fn email(field: &str, value: &str) -> Result<Email, AppError> {
    Email::parse(value.trim())
        .map_err(|_| AppError::BadRequest(format!("{field} must be a valid email address")))
}

/// # Errors
///
/// Returns `AppError::BadRequest` if the value is not a valid slug.
pub fn slug(field: &str, value: &str) -> Result<Slug, AppError> {
    Slug::parse(value).map_err(|e| AppError::BadRequest(format!("{field}: {e}")))
}

/// Trim a value and treat blank input as absent.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Distinguish a missing field from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent yields `None`, `null` yields `Some(None)`.
///
/// # Errors
///
/// Returns the deserializer's error if the value has the wrong type.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
