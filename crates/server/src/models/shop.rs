//! Shop domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use deinshop_core::{CategoryId, ShopId};

/// A listed shop.
///
/// Inactive shops stay in the table for admins but never appear publicly.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub url: String,
    pub category_id: CategoryId,
    pub region: String,
    pub pickup: String,
    pub shipping: String,
    pub description: String,
    pub og_image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A shop with its category's name and slug denormalized for listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShopListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub shop: Shop,
    pub category_name: String,
    pub category_slug: String,
}

/// The full set of writable shop fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopFields {
    pub name: String,
    pub url: String,
    pub category_id: CategoryId,
    pub region: String,
    pub pickup: String,
    pub shipping: String,
    pub description: String,
    pub og_image: Option<String>,
    pub is_active: bool,
}

impl From<&Shop> for ShopFields {
    fn from(shop: &Shop) -> Self {
        Self {
            name: shop.name.clone(),
            url: shop.url.clone(),
            category_id: shop.category_id,
            region: shop.region.clone(),
            pickup: shop.pickup.clone(),
            shipping: shop.shipping.clone(),
            description: shop.description.clone(),
            og_image: shop.og_image.clone(),
            is_active: shop.is_active,
        }
    }
}
