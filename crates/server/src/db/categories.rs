//! Category repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use deinshop_core::{CategoryId, Slug};

use super::RepositoryError;
use crate::models::{Category, CategoryFields, CategoryWithCount};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
    icon: String,
    description: String,
    sort_order: i64,
    image_url: Option<String>,
    image_photographer: Option<String>,
    image_photographer_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            slug,
            icon: row.icon,
            description: row.description,
            sort_order: row.sort_order,
            image_url: row.image_url,
            image_photographer: row.image_photographer,
            image_photographer_url: row.image_photographer_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryWithCountRow {
    #[sqlx(flatten)]
    category: CategoryRow,
    shop_count: i64,
}

impl TryFrom<CategoryWithCountRow> for CategoryWithCount {
    type Error = RepositoryError;

    fn try_from(row: CategoryWithCountRow) -> Result<Self, Self::Error> {
        Ok(Self {
            category: row.category.try_into()?,
            shop_count: row.shop_count,
        })
    }
}

const CONFLICT_MESSAGE: &str = "Category name or slug already exists";

// =============================================================================
// Repository
// =============================================================================

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List categories ordered by sort order, then name, with shop counts.
    ///
    /// When `active_only` is set only active shops are counted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored slug is invalid.
    #[tracing::instrument(skip(self))]
    pub async fn list_with_counts(
        &self,
        active_only: bool,
    ) -> Result<Vec<CategoryWithCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryWithCountRow>(
            r"
            SELECT c.id, c.name, c.slug, c.icon, c.description, c.sort_order,
                   c.image_url, c.image_photographer, c.image_photographer_url,
                   c.created_at, c.updated_at,
                   (SELECT COUNT(*) FROM shops s
                     WHERE s.category_id = c.id
                       AND (s.is_active = 1 OR ?1 = 0)) AS shop_count
            FROM categories c
            ORDER BY c.sort_order, c.name
            ",
        )
        .bind(active_only)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored slug is invalid.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, icon, description, sort_order,
                   image_url, image_photographer, image_photographer_url,
                   created_at, updated_at
            FROM categories
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored slug is invalid.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, icon, description, sort_order,
                   image_url, image_photographer, image_photographer_url,
                   created_at, updated_at
            FROM categories
            WHERE slug = ?
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Categories whose name contains `needle`, ignoring case.
    ///
    /// Case folding happens here rather than in SQL because `SQLite`'s
    /// `lower()` leaves non-ASCII letters such as `Ö` untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored slug is invalid.
    pub async fn search_by_name(
        &self,
        needle: &str,
        limit: usize,
    ) -> Result<Vec<Category>, RepositoryError> {
        let needle = needle.to_lowercase();
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, icon, description, sort_order,
                   image_url, image_photographer, image_photographer_url,
                   created_at, updated_at
            FROM categories
            ORDER BY sort_order, name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .filter(|row| row.name.to_lowercase().contains(&needle))
            .take(limit)
            .map(TryInto::try_into)
            .collect()
    }

    /// Check whether a category with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name or slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip(self, fields), fields(slug = %fields.slug))]
    pub async fn create(&self, fields: &CategoryFields) -> Result<Category, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO categories (name, slug, icon, description, sort_order,
                                    image_url, image_photographer, image_photographer_url,
                                    created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, slug, icon, description, sort_order,
                      image_url, image_photographer, image_photographer_url,
                      created_at, updated_at
            ",
        )
        .bind(&fields.name)
        .bind(fields.slug.as_str())
        .bind(&fields.icon)
        .bind(&fields.description)
        .bind(fields.sort_order)
        .bind(&fields.image_url)
        .bind(&fields.image_photographer)
        .bind(&fields.image_photographer_url)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, CONFLICT_MESSAGE))?;

        row.try_into()
    }

    /// Overwrite all writable fields of a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if the new name or slug is taken.
    #[tracing::instrument(skip(self, fields), fields(category_id = %id))]
    pub async fn update(
        &self,
        id: CategoryId,
        fields: &CategoryFields,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE categories
            SET name = ?, slug = ?, icon = ?, description = ?, sort_order = ?,
                image_url = ?, image_photographer = ?, image_photographer_url = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING id, name, slug, icon, description, sort_order,
                      image_url, image_photographer, image_photographer_url,
                      created_at, updated_at
            ",
        )
        .bind(&fields.name)
        .bind(fields.slug.as_str())
        .bind(&fields.icon)
        .bind(&fields.description)
        .bind(fields.sort_order)
        .bind(&fields.image_url)
        .bind(&fields.image_photographer)
        .bind(&fields.image_photographer_url)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, CONFLICT_MESSAGE))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Replace the image reference and its attribution.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_image(
        &self,
        id: CategoryId,
        image_url: Option<&str>,
        photographer: Option<&str>,
        photographer_url: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE categories
            SET image_url = ?, image_photographer = ?, image_photographer_url = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING id, name, slug, icon, description, sort_order,
                      image_url, image_photographer, image_photographer_url,
                      created_at, updated_at
            ",
        )
        .bind(image_url)
        .bind(photographer)
        .bind(photographer_url)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if shops still reference it.
    #[tracing::instrument(skip(self), fields(category_id = %id))]
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict("Category still has shops".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::db::test_pool;

    pub(crate) fn fields(name: &str, slug: &str) -> CategoryFields {
        CategoryFields {
            name: name.to_owned(),
            slug: Slug::parse(slug).unwrap(),
            icon: String::new(),
            description: String::new(),
            sort_order: 0,
            image_url: None,
            image_photographer: None,
            image_photographer_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_by_slug() {
        let pool = test_pool().await;
        let repo = CategoryRepository::new(&pool);

        let created = repo.create(&fields("Kaffee", "kaffee")).await.unwrap();
        let fetched = repo.get_by_slug("kaffee").await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "Kaffee");
        assert!(repo.exists(created.id).await.unwrap());
        assert!(!repo.exists(CategoryId::new(999)).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let pool = test_pool().await;
        let repo = CategoryRepository::new(&pool);

        repo.create(&fields("Kaffee", "kaffee")).await.unwrap();
        let err = repo.create(&fields("Kaffee 2", "kaffee")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_orders_by_sort_order_then_name() {
        let pool = test_pool().await;
        let repo = CategoryRepository::new(&pool);

        let mut tee = fields("Tee", "tee");
        tee.sort_order = 1;
        repo.create(&tee).await.unwrap();
        repo.create(&fields("Wein", "wein")).await.unwrap();
        repo.create(&fields("Bier", "bier")).await.unwrap();

        let names: Vec<_> = repo
            .list_with_counts(true)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.category.name)
            .collect();
        assert_eq!(names, ["Bier", "Wein", "Tee"]);
    }

    #[tokio::test]
    async fn test_delete_missing_category_is_not_found() {
        let pool = test_pool().await;
        let repo = CategoryRepository::new(&pool);
        let err = repo.delete(CategoryId::new(42)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
