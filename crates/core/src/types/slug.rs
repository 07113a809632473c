//! URL slug for categories.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug must be at most {max} characters")]
    TooLong { max: usize },
    #[error("slug may only contain lowercase letters, digits and hyphens")]
    InvalidCharacter,
}

/// A category slug such as `kaffee-tee`.
///
/// Lowercase ASCII letters, digits and hyphens, 1-100 characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub const MAX_LENGTH: usize = 100;

    /// # Errors
    ///
    /// Returns a [`SlugError`] if the input is empty, too long, or contains
    /// characters outside `[a-z0-9-]`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(SlugError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_kebab_case() {
        assert!(Slug::parse("kaffee-tee").is_ok());
        assert!(Slug::parse("3d-druck").is_ok());
    }

    #[test]
    fn rejects_uppercase_and_spaces() {
        assert_eq!(Slug::parse("Kaffee"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::parse("a b"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::parse("ümlaut"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
    }

    #[test]
    fn rejects_overlong() {
        assert!(matches!(
            Slug::parse(&"a".repeat(101)),
            Err(SlugError::TooLong { .. })
        ));
    }
}
