//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimitStore;
use crate::services::{ImageStore, Notifier, PhotoSearchClient, PhotoSearchError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: SqlitePool,
    notifier: Arc<dyn Notifier>,
    rate_limits: Arc<dyn RateLimitStore>,
    images: ImageStore,
    photos: Option<PhotoSearchClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The photo search client is only built when `config.photo_search` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the photo search client cannot be built.
    pub fn new(
        config: ServerConfig,
        pool: SqlitePool,
        notifier: Arc<dyn Notifier>,
        rate_limits: Arc<dyn RateLimitStore>,
    ) -> Result<Self, PhotoSearchError> {
        let photos = config
            .photo_search
            .as_ref()
            .map(|photo_config| PhotoSearchClient::new(photo_config, config.outbound_timeout))
            .transpose()?;
        let images = ImageStore::new(config.image_path.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                notifier,
                rate_limits,
                images,
                photos,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Outbound notifications to submitters.
    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    /// Shared counter store for all rate-limited routes.
    #[must_use]
    pub fn rate_limits(&self) -> Arc<dyn RateLimitStore> {
        Arc::clone(&self.inner.rate_limits)
    }

    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.inner.images
    }

    /// Photo search client, if configured.
    #[must_use]
    pub fn photos(&self) -> Option<&PhotoSearchClient> {
        self.inner.photos.as_ref()
    }
}
