//! Shop repository.
//!
//! The `shops_fts` index is maintained by triggers, so every write here keeps
//! search results in step with the table within the same statement.

use chrono::Utc;
use sqlx::SqlitePool;

use deinshop_core::{CategoryId, ShopId};

use super::RepositoryError;
use crate::models::{Shop, ShopFields, ShopListing};

/// Repository for shop database operations.
pub struct ShopRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ShopRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all active shops with their category, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<ShopListing>, RepositoryError> {
        let shops = sqlx::query_as::<_, ShopListing>(
            r"
            SELECT s.id, s.name, s.url, s.category_id, s.region, s.pickup, s.shipping,
                   s.description, s.og_image, s.is_active, s.created_at, s.updated_at,
                   c.name AS category_name, c.slug AS category_slug
            FROM shops s
            JOIN categories c ON c.id = s.category_id
            WHERE s.is_active = 1
            ORDER BY s.name COLLATE NOCASE, s.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(shops)
    }

    /// List the active shops of one category, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<ShopListing>, RepositoryError> {
        let shops = sqlx::query_as::<_, ShopListing>(
            r"
            SELECT s.id, s.name, s.url, s.category_id, s.region, s.pickup, s.shipping,
                   s.description, s.og_image, s.is_active, s.created_at, s.updated_at,
                   c.name AS category_name, c.slug AS category_slug
            FROM shops s
            JOIN categories c ON c.id = s.category_id
            WHERE s.is_active = 1 AND s.category_id = ?
            ORDER BY s.name COLLATE NOCASE, s.id
            ",
        )
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;

        Ok(shops)
    }

    /// List every shop, active or not, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<ShopListing>, RepositoryError> {
        let shops = sqlx::query_as::<_, ShopListing>(
            r"
            SELECT s.id, s.name, s.url, s.category_id, s.region, s.pickup, s.shipping,
                   s.description, s.og_image, s.is_active, s.created_at, s.updated_at,
                   c.name AS category_name, c.slug AS category_slug
            FROM shops s
            JOIN categories c ON c.id = s.category_id
            ORDER BY s.created_at DESC, s.id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(shops)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ShopId) -> Result<Option<Shop>, RepositoryError> {
        let shop = sqlx::query_as::<_, Shop>(
            r"
            SELECT id, name, url, category_id, region, pickup, shipping, description,
                   og_image, is_active, created_at, updated_at
            FROM shops
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(shop)
    }

    /// Create a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[tracing::instrument(skip(self, fields), fields(name = %fields.name))]
    pub async fn create(&self, fields: &ShopFields) -> Result<Shop, RepositoryError> {
        let now = Utc::now();
        let shop = sqlx::query_as::<_, Shop>(
            r"
            INSERT INTO shops (name, url, category_id, region, pickup, shipping,
                               description, og_image, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, url, category_id, region, pickup, shipping, description,
                      og_image, is_active, created_at, updated_at
            ",
        )
        .bind(&fields.name)
        .bind(&fields.url)
        .bind(fields.category_id)
        .bind(&fields.region)
        .bind(&fields.pickup)
        .bind(&fields.shipping)
        .bind(&fields.description)
        .bind(&fields.og_image)
        .bind(fields.is_active)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(shop)
    }

    /// Overwrite all writable fields of a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shop does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip(self, fields), fields(shop_id = %id))]
    pub async fn update(&self, id: ShopId, fields: &ShopFields) -> Result<Shop, RepositoryError> {
        sqlx::query_as::<_, Shop>(
            r"
            UPDATE shops
            SET name = ?, url = ?, category_id = ?, region = ?, pickup = ?, shipping = ?,
                description = ?, og_image = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, name, url, category_id, region, pickup, shipping, description,
                      og_image, is_active, created_at, updated_at
            ",
        )
        .bind(&fields.name)
        .bind(&fields.url)
        .bind(fields.category_id)
        .bind(&fields.region)
        .bind(&fields.pickup)
        .bind(&fields.shipping)
        .bind(&fields.description)
        .bind(&fields.og_image)
        .bind(fields.is_active)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a shop together with its dead-link reports.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shop does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip(self), fields(shop_id = %id))]
    pub async fn delete(&self, id: ShopId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let reports = sqlx::query("DELETE FROM dead_link_reports WHERE shop_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM shops WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        tracing::info!(
            reports_removed = reports.rows_affected(),
            "Shop deleted"
        );
        Ok(())
    }
}
