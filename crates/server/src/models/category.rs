//! Category domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use deinshop_core::{CategoryId, Slug};

/// A shop category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    /// Short emoji or icon code shown next to the name.
    pub icon: String,
    pub description: String,
    pub sort_order: i64,
    /// Either an absolute URL or a `/uploads/...` path for locally stored images.
    pub image_url: Option<String>,
    pub image_photographer: Option<String>,
    pub image_photographer_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// File name of the locally uploaded image, if the image is hosted here.
    #[must_use]
    pub fn uploaded_file_name(&self) -> Option<&str> {
        self.image_url.as_deref().and_then(uploaded_file_name)
    }
}

/// A category together with the number of active shops it contains.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub shop_count: i64,
}

/// The full set of writable category fields.
///
/// Used for both inserts and updates; partial updates are merged into one of
/// these before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFields {
    pub name: String,
    pub slug: Slug,
    pub icon: String,
    pub description: String,
    pub sort_order: i64,
    pub image_url: Option<String>,
    pub image_photographer: Option<String>,
    pub image_photographer_url: Option<String>,
}

impl From<&Category> for CategoryFields {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            icon: category.icon.clone(),
            description: category.description.clone(),
            sort_order: category.sort_order,
            image_url: category.image_url.clone(),
            image_photographer: category.image_photographer.clone(),
            image_photographer_url: category.image_photographer_url.clone(),
        }
    }
}

/// Prefix under which uploaded images are served.
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// Extract the file name from a `/uploads/<file>` reference.
///
/// Returns `None` for external URLs and for anything that tries to leave the
/// uploads directory.
#[must_use]
pub fn uploaded_file_name(image_url: &str) -> Option<&str> {
    let name = image_url.strip_prefix(UPLOADS_PREFIX)?;
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
        return None;
    }
    Some(name)
}
