//! Category management handlers, including cover image upload.
//!
//! Whenever a category stops pointing at a locally uploaded file, that file
//! is deleted from the image directory.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use deinshop_core::CategoryId;

use crate::db::{CategoryRepository, RepositoryError};
use crate::error::AppError;
use crate::extract::{JsonBody, MultipartBody, PathParam};
use crate::middleware::RequireAdmin;
use crate::models::{Category, CategoryFields, CategoryWithCount};
use crate::response::{DataResponse, Message, message};
use crate::services::ImageError;
use crate::state::AppState;
use crate::validation::{self, double_option};

/// Multipart field carrying the uploaded file.
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_order: i64,
    pub image_url: Option<String>,
    pub image_photographer: Option<String>,
    pub image_photographer_url: Option<String>,
}

/// Partial category update. The image fields accept `null` to clear them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_photographer: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_photographer_url: Option<Option<String>>,
}

/// Category input before the slug is parsed.
struct RawCategory {
    name: String,
    slug: String,
    icon: String,
    description: String,
    sort_order: i64,
    image_url: Option<String>,
    image_photographer: Option<String>,
    image_photographer_url: Option<String>,
}

impl From<CreateCategoryRequest> for RawCategory {
    fn from(req: CreateCategoryRequest) -> Self {
        Self {
            name: req.name,
            slug: req.slug,
            icon: req.icon,
            description: req.description,
            sort_order: req.sort_order,
            image_url: req.image_url,
            image_photographer: req.image_photographer,
            image_photographer_url: req.image_photographer_url,
        }
    }
}

impl UpdateCategoryRequest {
    fn apply(self, category: &Category) -> RawCategory {
        RawCategory {
            name: self.name.unwrap_or_else(|| category.name.clone()),
            slug: self
                .slug
                .unwrap_or_else(|| category.slug.as_str().to_owned()),
            icon: self.icon.unwrap_or_else(|| category.icon.clone()),
            description: self
                .description
                .unwrap_or_else(|| category.description.clone()),
            sort_order: self.sort_order.unwrap_or(category.sort_order),
            image_url: self
                .image_url
                .unwrap_or_else(|| category.image_url.clone()),
            image_photographer: self
                .image_photographer
                .unwrap_or_else(|| category.image_photographer.clone()),
            image_photographer_url: self
                .image_photographer_url
                .unwrap_or_else(|| category.image_photographer_url.clone()),
        }
    }
}

impl RawCategory {
    fn validate(self) -> Result<CategoryFields, AppError> {
        let name = self.name.trim().to_owned();
        let icon = self.icon.trim().to_owned();
        let description = self.description.trim().to_owned();
        validation::length("name", &name, 1, 100)?;
        validation::length("slug", self.slug.trim(), 1, 100)?;
        let slug = validation::slug("slug", self.slug.trim())?;
        validation::length("icon", &icon, 0, 10)?;
        validation::length("description", &description, 0, 200)?;

        let image_url = validation::non_blank(self.image_url);
        let image_photographer = validation::non_blank(self.image_photographer);
        let image_photographer_url = validation::non_blank(self.image_photographer_url);
        if let Some(url) = &image_url {
            validation::image_url("imageUrl", url)?;
        }
        validation::max_length("imagePhotographer", image_photographer.as_deref(), 200)?;
        if let Some(url) = &image_photographer_url {
            validation::http_url("imagePhotographerUrl", url)?;
        }

        Ok(CategoryFields {
            name,
            slug,
            icon,
            description,
            sort_order: self.sort_order,
            image_url,
            image_photographer,
            image_photographer_url,
        })
    }
}

fn category_not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}

fn not_found_as_category(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => category_not_found(),
        other => other.into(),
    }
}

async fn load(state: &AppState, id: CategoryId) -> Result<Category, AppError> {
    CategoryRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(category_not_found)
}

/// `GET /api/admin/categories`
///
/// Counts include inactive shops.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<DataResponse<Vec<CategoryWithCount>>, AppError> {
    let categories = CategoryRepository::new(state.pool())
        .list_with_counts(false)
        .await?;
    Ok(DataResponse::new(categories))
}

/// `POST /api/admin/categories`
#[instrument(skip(state, admin, body), fields(admin_user_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    JsonBody(body): JsonBody<CreateCategoryRequest>,
) -> Result<(StatusCode, DataResponse<Category>), AppError> {
    let fields = RawCategory::from(body).validate()?;
    let category = CategoryRepository::new(state.pool()).create(&fields).await?;
    tracing::info!(category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, DataResponse::new(category)))
}

/// `PUT|PATCH /api/admin/categories/{id}`
#[instrument(skip(state, admin, body), fields(admin_user_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<i64>,
    JsonBody(body): JsonBody<UpdateCategoryRequest>,
) -> Result<DataResponse<Category>, AppError> {
    let id = CategoryId::new(id);
    let current = load(&state, id).await?;
    let fields = body.apply(&current).validate()?;

    let category = CategoryRepository::new(state.pool())
        .update(id, &fields)
        .await
        .map_err(not_found_as_category)?;
    state
        .images()
        .remove_replaced(current.image_url.as_deref(), category.image_url.as_deref())
        .await;

    Ok(DataResponse::new(category))
}

/// `DELETE /api/admin/categories/{id}`
///
/// Refused with 409 while shops still belong to the category.
#[instrument(skip(state, admin), fields(admin_user_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<i64>,
) -> Result<DataResponse<Message>, AppError> {
    let id = CategoryId::new(id);
    let current = load(&state, id).await?;

    CategoryRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found_as_category)?;
    if let Some(image_url) = current.image_url.as_deref() {
        state.images().remove(image_url).await;
    }

    Ok(message("Category deleted"))
}

/// `POST /api/admin/categories/{id}/image`
///
/// Stores the multipart field `image` and points the category at it. Any
/// photographer attribution is cleared.
#[instrument(skip(state, admin, multipart), fields(admin_user_id = %admin.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<i64>,
    MultipartBody(mut multipart): MultipartBody,
) -> Result<DataResponse<Category>, AppError> {
    let id = CategoryId::new(id);
    let current = load(&state, id).await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            let content_type = field.content_type().unwrap_or_default().to_owned();
            let bytes = field.bytes().await?;
            upload = Some((content_type, bytes));
            break;
        }
    }
    let (content_type, bytes) = upload.ok_or(ImageError::Empty)?;

    let image_url = state
        .images()
        .save(id, &current.slug, &content_type, &bytes)
        .await?;
    let category = match CategoryRepository::new(state.pool())
        .set_image(id, Some(&image_url), None, None)
        .await
    {
        Ok(category) => category,
        Err(e) => {
            // Nothing points at the new file; keep it only if it replaced the current one.
            state
                .images()
                .remove_replaced(Some(&image_url), current.image_url.as_deref())
                .await;
            return Err(not_found_as_category(e));
        }
    };
    state
        .images()
        .remove_replaced(current.image_url.as_deref(), Some(&image_url))
        .await;

    tracing::info!(category_id = %id, image_url = %image_url, "Category image uploaded");
    Ok(DataResponse::new(category))
}

/// `DELETE /api/admin/categories/{id}/image`
#[instrument(skip(state, admin), fields(admin_user_id = %admin.id))]
pub async fn remove_image(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<i64>,
) -> Result<DataResponse<Category>, AppError> {
    let id = CategoryId::new(id);
    let current = load(&state, id).await?;

    let category = CategoryRepository::new(state.pool())
        .set_image(id, None, None, None)
        .await
        .map_err(not_found_as_category)?;
    if let Some(image_url) = current.image_url.as_deref() {
        state.images().remove(image_url).await;
    }

    Ok(DataResponse::new(category))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use deinshop_core::Slug;

    use super::*;

    fn stored_category() -> Category {
        let now = Utc::now();
        Category {
            id: CategoryId::new(2),
            name: "Kaffee".to_owned(),
            slug: Slug::parse("kaffee").unwrap(),
            icon: "☕".to_owned(),
            description: "Röstereien".to_owned(),
            sort_order: 1,
            image_url: Some("/uploads/2-kaffee.jpg".to_owned()),
            image_photographer: None,
            image_photographer_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn create(json: serde_json::Value) -> Result<CategoryFields, AppError> {
        RawCategory::from(serde_json::from_value::<CreateCategoryRequest>(json).unwrap()).validate()
    }

    #[test]
    fn test_create_validation() {
        let fields = create(serde_json::json!({"name": " Tee ", "slug": "tee"})).unwrap();
        assert_eq!(fields.name, "Tee");
        assert_eq!(fields.slug.as_str(), "tee");
        assert_eq!(fields.image_url, None);

        assert!(create(serde_json::json!({"name": "Tee", "slug": "Tee Laden"})).is_err());
        assert!(create(serde_json::json!({"name": "", "slug": "tee"})).is_err());
        assert!(
            create(serde_json::json!({"name": "Tee", "slug": "tee", "icon": "x".repeat(11)}))
                .is_err()
        );
        assert!(
            create(serde_json::json!({"name": "Tee", "slug": "tee", "imageUrl": "/etc/passwd"}))
                .is_err()
        );
    }

    #[test]
    fn test_update_keeps_absent_fields_and_clears_null_image() {
        let patch: UpdateCategoryRequest =
            serde_json::from_value(serde_json::json!({"imageUrl": null, "sortOrder": 5})).unwrap();
        let fields = patch.apply(&stored_category()).validate().unwrap();
        assert_eq!(fields.image_url, None);
        assert_eq!(fields.sort_order, 5);
        assert_eq!(fields.name, "Kaffee");

        let untouched: UpdateCategoryRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        let fields = untouched.apply(&stored_category()).validate().unwrap();
        assert_eq!(fields.image_url.as_deref(), Some("/uploads/2-kaffee.jpg"));
    }

    #[test]
    fn test_image_errors_map_to_messages() {
        assert_eq!(
            AppError::from(ImageError::UnsupportedType).public_message(),
            "Only JPEG, PNG or WebP allowed"
        );
        assert_eq!(
            AppError::from(ImageError::TooLarge).public_message(),
            "File too large (max 5 MB)"
        );
        assert_eq!(
            AppError::from(ImageError::Empty).public_message(),
            "No image file provided"
        );
    }
}
