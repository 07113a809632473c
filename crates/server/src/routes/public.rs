//! Public directory endpoints.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use deinshop_core::{CategoryId, ShopId};

use crate::db::{CategoryRepository, ShopRepository, SubmissionRepository};
use crate::error::AppError;
use crate::extract::{JsonBody, PathParam, QueryParam};
use crate::middleware::rate_limit::ClientIp;
use crate::models::{Category, CategoryWithCount, NewSubmission, ShopListing};
use crate::response::{DataResponse, Message, message};
use crate::search::{self, SearchResults};
use crate::services::{ReportError, ReportService};
use crate::state::AppState;
use crate::validation;

/// Category page payload: the category plus its active shops.
#[derive(Debug, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub shops: Vec<ShopListing>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Public shop proposal.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub shop_name: String,
    pub shop_url: String,
    pub category_id: Option<i64>,
    pub category_suggestion: Option<String>,
    pub region: Option<String>,
    pub pickup: Option<String>,
    pub shipping: Option<String>,
    pub description: Option<String>,
    pub submitter_email: Option<String>,
    pub submitter_note: Option<String>,
}

impl SubmissionRequest {
    fn validate(self) -> Result<NewSubmission, AppError> {
        let shop_name = self.shop_name.trim().to_owned();
        let shop_url = self.shop_url.trim().to_owned();
        validation::length("shopName", &shop_name, 2, 100)?;
        validation::http_url("shopUrl", &shop_url)?;
        if let Some(id) = self.category_id
            && id <= 0
        {
            return Err(AppError::BadRequest(
                "categoryId must be a positive integer".to_string(),
            ));
        }

        let category_suggestion = validation::non_blank(self.category_suggestion);
        let submitter_note = validation::non_blank(self.submitter_note);
        validation::max_length("categorySuggestion", category_suggestion.as_deref(), 100)?;
        validation::max_length("region", self.region.as_deref(), 200)?;
        validation::max_length("pickup", self.pickup.as_deref(), 200)?;
        validation::max_length("shipping", self.shipping.as_deref(), 200)?;
        validation::max_length("description", self.description.as_deref(), 200)?;
        validation::max_length("submitterNote", submitter_note.as_deref(), 500)?;

        let submitter_email = validation::non_blank(self.submitter_email)
            .map(|email| validation::email("submitterEmail", &email))
            .transpose()?;

        Ok(NewSubmission {
            shop_name,
            shop_url,
            category_id: self.category_id.map(CategoryId::new),
            category_suggestion,
            region: self.region.unwrap_or_default().trim().to_owned(),
            pickup: self.pickup.unwrap_or_default().trim().to_owned(),
            shipping: self.shipping.unwrap_or_default().trim().to_owned(),
            description: self.description.unwrap_or_default().trim().to_owned(),
            submitter_email,
            submitter_note,
        })
    }
}

/// `GET /api/categories`
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<DataResponse<Vec<CategoryWithCount>>, AppError> {
    let categories = CategoryRepository::new(state.pool())
        .list_with_counts(true)
        .await?;
    Ok(DataResponse::new(categories))
}

/// `GET /api/categories/{slug}`
#[instrument(skip(state))]
pub async fn show_category(
    State(state): State<AppState>,
    PathParam(slug): PathParam<String>,
) -> Result<DataResponse<CategoryDetail>, AppError> {
    let category = CategoryRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;
    let shops = ShopRepository::new(state.pool())
        .list_active_by_category(category.id)
        .await?;

    Ok(DataResponse::new(CategoryDetail { category, shops }))
}

/// `GET /api/shops`
#[instrument(skip(state))]
pub async fn list_shops(
    State(state): State<AppState>,
) -> Result<DataResponse<Vec<ShopListing>>, AppError> {
    let shops = ShopRepository::new(state.pool()).list_active().await?;
    Ok(DataResponse::new(shops))
}

/// `GET /api/search?q=`
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    QueryParam(query): QueryParam<SearchQuery>,
) -> Result<DataResponse<SearchResults>, AppError> {
    let results = search::search(state.pool(), &query.q).await?;
    Ok(DataResponse::new(results))
}

/// `POST /api/submissions`
#[instrument(skip(state, body))]
pub async fn create_submission(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SubmissionRequest>,
) -> Result<(StatusCode, DataResponse<Message>), AppError> {
    let submission = body.validate()?;

    if let Some(category_id) = submission.category_id
        && !CategoryRepository::new(state.pool())
            .exists(category_id)
            .await?
    {
        return Err(AppError::BadRequest("Unknown categoryId".to_string()));
    }

    SubmissionRepository::new(state.pool())
        .create(&submission)
        .await?;

    Ok((StatusCode::CREATED, message("Vorschlag eingereicht")))
}

/// `POST /api/shops/{id}/report`
#[instrument(skip(state, ip))]
pub async fn report_dead_link(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    PathParam(id): PathParam<i64>,
) -> Result<(StatusCode, DataResponse<Message>), AppError> {
    ReportService::new(state.pool(), state.config().ip_hash_salt.as_ref())
        .report(ShopId::new(id), &ip)
        .await
        .map_err(|e| match e {
            ReportError::ShopNotFound => AppError::NotFound("Shop not found".to_string()),
            ReportError::Repository(e) => e.into(),
        })?;

    Ok((StatusCode::ACCEPTED, message("Danke für den Hinweis")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> SubmissionRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_submission_defaults_optional_text_fields() {
        let submission = request(serde_json::json!({
            "shopName": " Rösterei Süd ",
            "shopUrl": "https://roesterei.example",
            "submitterEmail": "  ",
        }))
        .validate()
        .unwrap();

        assert_eq!(submission.shop_name, "Rösterei Süd");
        assert_eq!(submission.region, "");
        assert!(submission.submitter_email.is_none());
        assert!(submission.category_id.is_none());
    }

    #[test]
    fn test_submission_rejects_bad_input() {
        let short = request(serde_json::json!({"shopName": "A", "shopUrl": "https://a.example"}));
        assert!(short.validate().is_err());

        let bad_url = request(serde_json::json!({"shopName": "Laden", "shopUrl": "laden"}));
        assert!(bad_url.validate().is_err());

        let bad_email = request(serde_json::json!({
            "shopName": "Laden",
            "shopUrl": "https://laden.example",
            "submitterEmail": "nope",
        }));
        assert!(bad_email.validate().is_err());

        let bad_category = request(serde_json::json!({
            "shopName": "Laden",
            "shopUrl": "https://laden.example",
            "categoryId": 0,
        }));
        assert!(bad_category.validate().is_err());

        let long_note = request(serde_json::json!({
            "shopName": "Laden",
            "shopUrl": "https://laden.example",
            "submitterNote": "x".repeat(501),
        }));
        assert!(long_note.validate().is_err());
    }
}
