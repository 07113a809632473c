//! Combined shop and category search.
//!
//! Shops are matched through the `shops_fts` FTS5 index with every query
//! token treated as a prefix, ranked by `bm25` (lower is better). Categories
//! are matched by a case-insensitive substring of their name. Queries shorter
//! than [`MIN_QUERY_CHARS`] short-circuit to an empty result without touching
//! the database.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{CategoryRepository, RepositoryError};
use crate::models::{Category, ShopListing};

/// Minimum number of characters (after trimming) before a search runs.
pub const MIN_QUERY_CHARS: usize = 2;
pub const SHOP_LIMIT: i64 = 20;
pub const CATEGORY_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub shops: Vec<ShopListing>,
    pub categories: Vec<Category>,
    pub query: String,
    pub total: usize,
}

impl SearchResults {
    fn empty(query: String) -> Self {
        Self {
            shops: Vec::new(),
            categories: Vec::new(),
            query,
            total: 0,
        }
    }
}

/// Build an FTS5 `MATCH` expression where every token is a quoted prefix term.
///
/// Tokens are split on anything that is not alphanumeric, so user input can
/// never inject FTS5 operators or column filters. Returns `None` when the
/// input has no searchable token.
#[must_use]
pub fn fts_prefix_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| format!("\"{token}\"*"))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

/// Search active shops and categories.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
/// Returns `RepositoryError::DataCorruption` if a stored category is invalid.
#[tracing::instrument(skip(pool))]
pub async fn search(pool: &SqlitePool, raw_query: &str) -> Result<SearchResults, RepositoryError> {
    let query = raw_query.trim().to_owned();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Ok(SearchResults::empty(query));
    }

    let shops = match fts_prefix_query(&query) {
        Some(expression) => {
            sqlx::query_as::<_, ShopListing>(
                r"
                SELECT s.id, s.name, s.url, s.category_id, s.region, s.pickup, s.shipping,
                       s.description, s.og_image, s.is_active, s.created_at, s.updated_at,
                       c.name AS category_name, c.slug AS category_slug
                FROM shops_fts
                JOIN shops s ON s.id = shops_fts.rowid
                JOIN categories c ON c.id = s.category_id
                WHERE shops_fts MATCH ? AND s.is_active = 1
                ORDER BY bm25(shops_fts), s.id
                LIMIT ?
                ",
            )
            .bind(expression)
            .bind(SHOP_LIMIT)
            .fetch_all(pool)
            .await?
        }
        None => Vec::new(),
    };

    let categories = CategoryRepository::new(pool)
        .search_by_name(&query, CATEGORY_LIMIT)
        .await?;

    let total = shops.len() + categories.len();
    Ok(SearchResults {
        shops,
        categories,
        query,
        total,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::categories::tests::fields as category_fields;
    use crate::db::shops::tests::fields as shop_fields;
    use crate::db::{ShopRepository, test_pool};
    use crate::models::ShopFields;

    #[test]
    fn test_fts_prefix_query_quotes_tokens() {
        assert_eq!(fts_prefix_query("kaffee berlin").as_deref(), Some("\"kaffee\"* \"berlin\"*"));
        assert_eq!(fts_prefix_query("  bio-tee ").as_deref(), Some("\"bio\"* \"tee\"*"));
        assert_eq!(fts_prefix_query("Müsli").as_deref(), Some("\"Müsli\"*"));
    }

    #[test]
    fn test_fts_prefix_query_strips_operators() {
        assert_eq!(
            fts_prefix_query("name:foo OR \"bar").as_deref(),
            Some("\"name\"* \"foo\"* \"OR\"* \"bar\"*")
        );
        assert_eq!(fts_prefix_query("*** ---"), None);
    }

    #[tokio::test]
    async fn test_category_match_folds_umlauts() {
        let pool = test_pool().await;
        let categories = CategoryRepository::new(&pool);
        categories
            .create(&category_fields("ÖKO Mode", "oeko-mode"))
            .await
            .unwrap();
        categories
            .create(&category_fields("100% Bio", "bio"))
            .await
            .unwrap();

        let results = search(&pool, "öko").await.unwrap();
        assert_eq!(results.categories.len(), 1);
        assert_eq!(results.categories[0].name, "ÖKO Mode");

        // LIKE wildcards are plain text here
        let results = search(&pool, "0%").await.unwrap();
        assert_eq!(results.categories.len(), 1);
        assert!(search(&pool, "_o").await.unwrap().categories.is_empty());
    }

    #[tokio::test]
    async fn test_short_query_returns_empty() {
        let pool = test_pool().await;
        let results = search(&pool, " k ").await.unwrap();
        assert!(results.shops.is_empty());
        assert!(results.categories.is_empty());
        assert_eq!(results.total, 0);
        assert_eq!(results.query, "k");
    }

    async fn seed(pool: &SqlitePool) -> (crate::models::Category, ShopRepository<'_>) {
        let category = CategoryRepository::new(pool)
            .create(&category_fields("Kaffee & Tee", "kaffee-tee"))
            .await
            .unwrap();
        (category, ShopRepository::new(pool))
    }

    #[tokio::test]
    async fn test_prefix_search_finds_active_shops_and_categories() {
        let pool = test_pool().await;
        let (category, shops) = seed(&pool).await;

        let mut roastery = shop_fields("Rösterei Nord", category.id);
        roastery.description = "Kaffeebohnen aus eigener Röstung".to_owned();
        shops.create(&roastery).await.unwrap();

        let mut hidden = shop_fields("Kaffeehaus Geschlossen", category.id);
        hidden.is_active = false;
        shops.create(&hidden).await.unwrap();

        let results = search(&pool, "kaff").await.unwrap();
        assert_eq!(results.shops.len(), 1);
        assert_eq!(results.shops[0].shop.name, "Rösterei Nord");
        assert_eq!(results.categories.len(), 1);
        assert_eq!(results.total, 2);
    }

    #[tokio::test]
    async fn test_index_follows_updates_and_deletes() {
        let pool = test_pool().await;
        let (category, shops) = seed(&pool).await;
        let shop = shops.create(&shop_fields("Alter Name", category.id)).await.unwrap();

        let renamed = ShopFields {
            name: "Frischer Laden".to_owned(),
            ..ShopFields::from(&shop)
        };
        shops.update(shop.id, &renamed).await.unwrap();

        assert!(search(&pool, "alter").await.unwrap().shops.is_empty());
        assert_eq!(search(&pool, "frisch").await.unwrap().shops.len(), 1);

        shops.delete(shop.id).await.unwrap();
        assert!(search(&pool, "frisch").await.unwrap().shops.is_empty());
    }

    #[tokio::test]
    async fn test_ranking_prefers_more_relevant_shop() {
        let pool = test_pool().await;
        let (category, shops) = seed(&pool).await;

        let mut weak = shop_fields("Feinkost Allerlei", category.id);
        weak.description = "Auch etwas Honig im Sortiment, dazu Käse, Wein, Öl und Brot".to_owned();
        shops.create(&weak).await.unwrap();

        let mut strong = shop_fields("Honig Honig", category.id);
        strong.description = "Honig direkt vom Imker".to_owned();
        shops.create(&strong).await.unwrap();

        let results = search(&pool, "honig").await.unwrap();
        assert_eq!(results.shops.len(), 2);
        assert_eq!(results.shops[0].shop.name, "Honig Honig");
    }
}
