//! Visitor reports of unreachable shop links.
//!
//! Reporter IPs are stored only as salted SHA-256 digests, which is enough to
//! count one report per visitor and shop.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;

use deinshop_core::ShopId;

use crate::db::{DeadLinkReportRepository, RepositoryError, ShopRepository};

#[derive(Debug, Error)]
pub enum ReportError {
    /// Unknown or inactive shop.
    #[error("shop not found")]
    ShopNotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Hex-encoded `sha256(salt || ip)`.
#[must_use]
pub fn hash_ip(salt: Option<&SecretString>, ip: &str) -> String {
    let mut hasher = Sha256::new();
    if let Some(salt) = salt {
        hasher.update(salt.expose_secret().as_bytes());
    }
    hasher.update(ip.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct ReportService<'a> {
    shops: ShopRepository<'a>,
    reports: DeadLinkReportRepository<'a>,
    salt: Option<&'a SecretString>,
}

impl<'a> ReportService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, salt: Option<&'a SecretString>) -> Self {
        Self {
            shops: ShopRepository::new(pool),
            reports: DeadLinkReportRepository::new(pool),
            salt,
        }
    }

    /// Record that `ip` could not reach the shop's website.
    ///
    /// Returns `false` if this visitor already reported the shop.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::ShopNotFound` for unknown or inactive shops.
    #[tracing::instrument(skip(self, ip), fields(shop_id = %shop_id))]
    pub async fn report(&self, shop_id: ShopId, ip: &str) -> Result<bool, ReportError> {
        match self.shops.get_by_id(shop_id).await? {
            Some(shop) if shop.is_active => {}
            _ => return Err(ReportError::ShopNotFound),
        }

        let recorded = self.reports.record(shop_id, &hash_ip(self.salt, ip)).await?;
        if recorded {
            tracing::info!("Dead link reported");
        } else {
            tracing::debug!("Duplicate dead link report ignored");
        }
        Ok(recorded)
    }
}
