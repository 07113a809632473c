//! Local storage for uploaded category images.
//!
//! Files live flat in one directory and are named `{category id}-{slug}.{ext}`,
//! so a category has at most one uploaded file per image type. They are
//! served under `/uploads/`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use deinshop_core::{CategoryId, Slug};

use crate::models::category::{UPLOADS_PREFIX, uploaded_file_name};

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("unsupported image type")]
    UnsupportedType,

    #[error("image exceeds {} bytes", MAX_IMAGE_BYTES)]
    TooLarge,

    #[error("image is empty")]
    Empty,

    #[error("image storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// File extension for an accepted MIME type.
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Directory-backed image store.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate and store an uploaded image, returning its public URL path.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::UnsupportedType`, `ImageError::TooLarge` or
    /// `ImageError::Empty` for invalid uploads, `ImageError::Io` if writing fails.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save(
        &self,
        category_id: CategoryId,
        slug: &Slug,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, ImageError> {
        let extension = extension_for(content_type).ok_or(ImageError::UnsupportedType)?;
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge);
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = format!("{category_id}-{slug}.{extension}");
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;

        Ok(format!("{UPLOADS_PREFIX}{file_name}"))
    }

    /// Delete the file behind a `/uploads/...` reference.
    ///
    /// External URLs and already missing files are ignored; other failures
    /// are logged, since the reference has already been dropped.
    pub async fn remove(&self, image_url: &str) {
        let Some(file_name) = uploaded_file_name(image_url) else {
            return;
        };

        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => tracing::info!(file = %file_name, "Removed uploaded image"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = %file_name, error = %e, "Failed to remove uploaded image"),
        }
    }

    /// Remove `old` if it is a local upload that `new` no longer points at.
    pub async fn remove_replaced(&self, old: Option<&str>, new: Option<&str>) {
        if let Some(old) = old
            && Some(old) != new
        {
            self.remove(old).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn slug() -> Slug {
        Slug::parse("kaffee").unwrap()
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("text/html"), None);
    }

    #[tokio::test]
    async fn test_save_writes_deterministic_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("uploads"));

        let url = store
            .save(CategoryId::new(3), &slug(), "image/jpeg", b"jpegdata")
            .await
            .unwrap();
        assert_eq!(url, "/uploads/3-kaffee.jpg");
        let stored = tokio::fs::read(dir.path().join("uploads/3-kaffee.jpg"))
            .await
            .unwrap();
        assert_eq!(stored, b"jpegdata");
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let gif = store.save(CategoryId::new(1), &slug(), "image/gif", b"x").await;
        assert!(matches!(gif, Err(ImageError::UnsupportedType)));

        let empty = store.save(CategoryId::new(1), &slug(), "image/png", b"").await;
        assert!(matches!(empty, Err(ImageError::Empty)));

        let big = vec![0u8; MAX_IMAGE_BYTES + 1];
        let too_large = store.save(CategoryId::new(1), &slug(), "image/png", &big).await;
        assert!(matches!(too_large, Err(ImageError::TooLarge)));
    }

    #[tokio::test]
    async fn test_remove_replaced_only_deletes_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let url = store
            .save(CategoryId::new(1), &slug(), "image/png", b"png")
            .await
            .unwrap();

        store.remove_replaced(Some(&url), Some(&url)).await;
        assert!(dir.path().join("1-kaffee.png").exists());

        store
            .remove_replaced(Some("https://images.example/photo.jpg"), None)
            .await;
        store.remove_replaced(Some(&url), None).await;
        assert!(!dir.path().join("1-kaffee.png").exists());

        // Removing twice is harmless.
        store.remove(&url).await;
    }
}
