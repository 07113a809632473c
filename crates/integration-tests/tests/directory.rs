//! Category and shop management as seen through the public directory.

use axum::http::StatusCode;
use serde_json::{Value, json};

use deinshop_integration_tests::TestContext;

fn shop(name: &str, category_id: i64) -> Value {
    json!({
        "name": name,
        "url": "https://shop.example",
        "categoryId": category_id,
        "region": "Berlin",
        "description": "Fair gehandelter Kaffee",
    })
}

fn names(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_category_crud() {
    let ctx = TestContext::new().await;
    let cookie = ctx.setup_owner().await;
    let id = ctx.create_category(&cookie, "Kaffee", "kaffee").await;

    let duplicate = ctx
        .post(
            "/api/admin/categories",
            json!({"name": "Kaffee", "slug": "kaffee"}),
            Some(&cookie),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let bad_slug = ctx
        .post(
            "/api/admin/categories",
            json!({"name": "Tee", "slug": "Tee & Co"}),
            Some(&cookie),
        )
        .await;
    assert_eq!(bad_slug.status, StatusCode::BAD_REQUEST);

    let updated = ctx
        .patch(
            &format!("/api/admin/categories/{id}"),
            json!({"icon": "☕", "description": "Röstereien"}),
            Some(&cookie),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["icon"], "☕");
    assert_eq!(updated.body["data"]["slug"], "kaffee");

    let listed = ctx.get("/api/admin/categories", Some(&cookie)).await;
    assert_eq!(names(&listed.body["data"]), vec!["Kaffee"]);
    assert_eq!(listed.body["data"][0]["shopCount"], 0);

    let deleted = ctx
        .delete(&format!("/api/admin/categories/{id}"), Some(&cookie))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["data"]["message"], "Category deleted");

    let missing = ctx
        .delete(&format!("/api/admin/categories/{id}"), Some(&cookie))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_with_shops_cannot_be_deleted() {
    let ctx = TestContext::new().await;
    let cookie = ctx.setup_owner().await;
    let category = ctx.create_category(&cookie, "Kaffee", "kaffee").await;
    ctx.create_shop(&cookie, shop("Bohnenhaus", category)).await;

    let response = ctx
        .delete(&format!("/api/admin/categories/{category}"), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let still_there = ctx.get("/api/categories/kaffee", None).await;
    assert_eq!(still_there.status, StatusCode::OK);
}

#[tokio::test]
async fn test_shop_requires_known_category() {
    let ctx = TestContext::new().await;
    let cookie = ctx.setup_owner().await;

    let response = ctx
        .post("/api/admin/shops", shop("Bohnenhaus", 42), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_message(), "Unknown categoryId");

    let bad_url = ctx
        .post(
            "/api/admin/shops",
            json!({"name": "Bohnenhaus", "url": "ftp://shop.example", "categoryId": 1}),
            Some(&cookie),
        )
        .await;
    assert_eq!(bad_url.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inactive_shops_are_hidden_from_public_views() {
    let ctx = TestContext::new().await;
    let cookie = ctx.setup_owner().await;
    let category = ctx.create_category(&cookie, "Kaffee", "kaffee").await;
    ctx.create_shop(&cookie, shop("Bohnenhaus", category)).await;
    let hidden = ctx.create_shop(&cookie, shop("Bohnenkeller", category)).await;

    let deactivated = ctx
        .patch(
            &format!("/api/admin/shops/{hidden}"),
            json!({"isActive": false}),
            Some(&cookie),
        )
        .await;
    assert_eq!(deactivated.status, StatusCode::OK);
    assert_eq!(deactivated.body["data"]["isActive"], false);

    let shops = ctx.get("/api/shops", None).await;
    assert_eq!(names(&shops.body["data"]), vec!["Bohnenhaus"]);
    assert_eq!(shops.body["data"][0]["categorySlug"], "kaffee");

    let categories = ctx.get("/api/categories", None).await;
    assert_eq!(categories.body["data"][0]["shopCount"], 1);

    let detail = ctx.get("/api/categories/kaffee", None).await;
    assert_eq!(detail.body["data"]["name"], "Kaffee");
    assert_eq!(names(&detail.body["data"]["shops"]), vec!["Bohnenhaus"]);

    let search = ctx.get("/api/search?q=bohnen", None).await;
    assert_eq!(names(&search.body["data"]["shops"]), vec!["Bohnenhaus"]);

    let admin = ctx.get("/api/admin/shops", Some(&cookie)).await;
    assert_eq!(admin.body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_category_slug_is_404() {
    let ctx = TestContext::new().await;
    let response = ctx.get("/api/categories/gibt-es-nicht", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_message(), "Category not found");
}

#[tokio::test]
async fn test_search() {
    let ctx = TestContext::new().await;
    let cookie = ctx.setup_owner().await;
    let category = ctx.create_category(&cookie, "Kaffee", "kaffee").await;
    let id = ctx.create_shop(&cookie, shop("Bohnenhaus", category)).await;

    let short = ctx.get("/api/search?q=b", None).await;
    assert_eq!(short.status, StatusCode::OK);
    assert_eq!(short.body["data"]["total"], 0);
    assert_eq!(short.body["data"]["query"], "b");

    let by_category = ctx.get("/api/search?q=kaff", None).await;
    assert_eq!(names(&by_category.body["data"]["categories"]), vec!["Kaffee"]);
    assert_eq!(names(&by_category.body["data"]["shops"]), vec!["Bohnenhaus"]);

    ctx.patch(
        &format!("/api/admin/shops/{id}"),
        json!({"name": "Teestube", "description": "Lose Tees"}),
        Some(&cookie),
    )
    .await;

    let old_name = ctx.get("/api/search?q=bohnenhaus", None).await;
    assert_eq!(old_name.body["data"]["shops"].as_array().unwrap().len(), 0);
    let new_name = ctx.get("/api/search?q=teest", None).await;
    assert_eq!(names(&new_name.body["data"]["shops"]), vec!["Teestube"]);

    let missing = ctx.get("/api/search", None).await;
    assert_eq!(missing.status, StatusCode::OK);
    assert_eq!(missing.body["data"]["total"], 0);
}

#[tokio::test]
async fn test_dead_link_reports() {
    let ctx = TestContext::new().await;
    let cookie = ctx.setup_owner().await;
    let category = ctx.create_category(&cookie, "Kaffee", "kaffee").await;
    let id = ctx.create_shop(&cookie, shop("Bohnenhaus", category)).await;

    let report = ctx
        .post(&format!("/api/shops/{id}/report"), json!({}), None)
        .await;
    assert_eq!(report.status, StatusCode::ACCEPTED);
    let repeat = ctx
        .post(&format!("/api/shops/{id}/report"), json!({}), None)
        .await;
    assert_eq!(repeat.status, StatusCode::ACCEPTED);

    let summary = ctx.get("/api/admin/dead-link-reports", Some(&cookie)).await;
    assert_eq!(summary.status, StatusCode::OK);
    let rows = summary.body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["shopName"], "Bohnenhaus");
    assert_eq!(rows[0]["reportCount"], 1);

    let unknown = ctx.post("/api/shops/999/report", json!({}), None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    ctx.patch(
        &format!("/api/admin/shops/{id}"),
        json!({"isActive": false}),
        Some(&cookie),
    )
    .await;
    let inactive = ctx
        .post(&format!("/api/shops/{id}/report"), json!({}), None)
        .await;
    assert_eq!(inactive.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_a_shop_removes_its_reports() {
    let ctx = TestContext::new().await;
    let cookie = ctx.setup_owner().await;
    let category = ctx.create_category(&cookie, "Kaffee", "kaffee").await;
    let id = ctx.create_shop(&cookie, shop("Bohnenhaus", category)).await;
    ctx.post(&format!("/api/shops/{id}/report"), json!({}), None)
        .await;

    let deleted = ctx
        .delete(&format!("/api/admin/shops/{id}"), Some(&cookie))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["data"]["message"], "Shop deleted");

    let reports: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dead_link_reports")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(reports, 0);

    let again = ctx
        .delete(&format!("/api/admin/shops/{id}"), Some(&cookie))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}
