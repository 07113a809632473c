//! Shop management handlers.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use deinshop_core::{CategoryId, ShopId};

use crate::db::{CategoryRepository, RepositoryError, ShopRepository};
use crate::error::AppError;
use crate::extract::{JsonBody, PathParam};
use crate::middleware::RequireAdmin;
use crate::models::{Shop, ShopFields, ShopListing};
use crate::response::{DataResponse, Message, message};
use crate::state::AppState;
use crate::validation::{self, double_option};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShopRequest {
    pub name: String,
    pub url: String,
    pub category_id: i64,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub pickup: String,
    #[serde(default)]
    pub shipping: String,
    #[serde(default)]
    pub description: String,
    pub og_image: Option<String>,
    pub is_active: Option<bool>,
}

/// Partial shop update. Absent fields keep their stored value; `ogImage`
/// may be set to `null` to clear it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShopRequest {
    pub name: Option<String>,
    pub url: Option<String>,
    pub category_id: Option<i64>,
    pub region: Option<String>,
    pub pickup: Option<String>,
    pub shipping: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub og_image: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl From<CreateShopRequest> for ShopFields {
    fn from(req: CreateShopRequest) -> Self {
        Self {
            name: req.name,
            url: req.url,
            category_id: CategoryId::new(req.category_id),
            region: req.region,
            pickup: req.pickup,
            shipping: req.shipping,
            description: req.description,
            og_image: req.og_image,
            is_active: req.is_active.unwrap_or(true),
        }
    }
}

impl UpdateShopRequest {
    fn apply(self, shop: &Shop) -> ShopFields {
        let mut fields = ShopFields::from(shop);
        if let Some(name) = self.name {
            fields.name = name;
        }
        if let Some(url) = self.url {
            fields.url = url;
        }
        if let Some(category_id) = self.category_id {
            fields.category_id = CategoryId::new(category_id);
        }
        if let Some(region) = self.region {
            fields.region = region;
        }
        if let Some(pickup) = self.pickup {
            fields.pickup = pickup;
        }
        if let Some(shipping) = self.shipping {
            fields.shipping = shipping;
        }
        if let Some(description) = self.description {
            fields.description = description;
        }
        if let Some(og_image) = self.og_image {
            fields.og_image = og_image;
        }
        if let Some(is_active) = self.is_active {
            fields.is_active = is_active;
        }
        fields
    }
}

/// Trim and check a complete set of shop fields.
fn validate(mut fields: ShopFields) -> Result<ShopFields, AppError> {
    fields.name = fields.name.trim().to_owned();
    fields.url = fields.url.trim().to_owned();
    fields.region = fields.region.trim().to_owned();
    fields.pickup = fields.pickup.trim().to_owned();
    fields.shipping = fields.shipping.trim().to_owned();
    fields.description = fields.description.trim().to_owned();
    fields.og_image = validation::non_blank(fields.og_image);

    validation::length("name", &fields.name, 1, 200)?;
    validation::http_url("url", &fields.url)?;
    if fields.category_id.as_i64() <= 0 {
        return Err(AppError::BadRequest(
            "categoryId must be a positive integer".to_string(),
        ));
    }
    validation::length("region", &fields.region, 0, 200)?;
    validation::length("pickup", &fields.pickup, 0, 200)?;
    validation::length("shipping", &fields.shipping, 0, 200)?;
    validation::length("description", &fields.description, 0, 500)?;
    if let Some(og_image) = &fields.og_image {
        validation::http_url("ogImage", og_image)?;
    }
    Ok(fields)
}

async fn ensure_category(state: &AppState, id: CategoryId) -> Result<(), AppError> {
    if CategoryRepository::new(state.pool()).exists(id).await? {
        Ok(())
    } else {
        Err(AppError::BadRequest("Unknown categoryId".to_string()))
    }
}

fn shop_not_found() -> AppError {
    AppError::NotFound("Shop not found".to_string())
}

/// `GET /api/admin/shops`
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<DataResponse<Vec<ShopListing>>, AppError> {
    let shops = ShopRepository::new(state.pool()).list_all().await?;
    Ok(DataResponse::new(shops))
}

/// `POST /api/admin/shops`
#[instrument(skip(state, admin, body), fields(admin_user_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    JsonBody(body): JsonBody<CreateShopRequest>,
) -> Result<(StatusCode, DataResponse<Shop>), AppError> {
    let fields = validate(body.into())?;
    ensure_category(&state, fields.category_id).await?;

    let shop = ShopRepository::new(state.pool()).create(&fields).await?;
    tracing::info!(shop_id = %shop.id, "Shop created");
    Ok((StatusCode::CREATED, DataResponse::new(shop)))
}

/// `PUT|PATCH /api/admin/shops/{id}`
#[instrument(skip(state, admin, body), fields(admin_user_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<i64>,
    JsonBody(body): JsonBody<UpdateShopRequest>,
) -> Result<DataResponse<Shop>, AppError> {
    let shops = ShopRepository::new(state.pool());
    let id = ShopId::new(id);
    let current = shops.get_by_id(id).await?.ok_or_else(shop_not_found)?;

    let category_changed = body.category_id.is_some();
    let fields = validate(body.apply(&current))?;
    if category_changed {
        ensure_category(&state, fields.category_id).await?;
    }

    let shop = shops.update(id, &fields).await.map_err(|e| match e {
        RepositoryError::NotFound => shop_not_found(),
        other => other.into(),
    })?;
    Ok(DataResponse::new(shop))
}

/// `DELETE /api/admin/shops/{id}`
#[instrument(skip(state, admin), fields(admin_user_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<i64>,
) -> Result<DataResponse<Message>, AppError> {
    ShopRepository::new(state.pool())
        .delete(ShopId::new(id))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => shop_not_found(),
            other => other.into(),
        })?;
    Ok(message("Shop deleted"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn stored_shop() -> Shop {
        let now = Utc::now();
        Shop {
            id: ShopId::new(4),
            name: "Hofladen Berger".to_owned(),
            url: "https://hofladen.example".to_owned(),
            category_id: CategoryId::new(1),
            region: "Allgäu".to_owned(),
            pickup: String::new(),
            shipping: "DE".to_owned(),
            description: "Käse und Milch".to_owned(),
            og_image: Some("https://hofladen.example/og.png".to_owned()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_update_merges_only_present_fields() {
        let patch: UpdateShopRequest =
            serde_json::from_value(serde_json::json!({"name": "Hofladen B.", "isActive": false}))
                .unwrap();
        let fields = patch.apply(&stored_shop());
        assert_eq!(fields.name, "Hofladen B.");
        assert!(!fields.is_active);
        assert_eq!(fields.region, "Allgäu");
        assert!(fields.og_image.is_some());
    }

    #[test]
    fn test_update_null_clears_og_image() {
        let patch: UpdateShopRequest =
            serde_json::from_value(serde_json::json!({"ogImage": null})).unwrap();
        assert_eq!(patch.apply(&stored_shop()).og_image, None);
    }

    #[test]
    fn test_validate_shop_fields() {
        let valid = ShopFields::from(&stored_shop());
        assert!(validate(valid.clone()).is_ok());

        let mut blank_name = valid.clone();
        blank_name.name = "  ".to_owned();
        assert_eq!(validate(blank_name).unwrap_err().public_message(), "name is required");

        let mut bad_url = valid.clone();
        bad_url.url = "hofladen".to_owned();
        assert!(validate(bad_url).is_err());

        let mut long_description = valid;
        long_description.description = "x".repeat(501);
        assert!(validate(long_description).is_err());
    }
}
