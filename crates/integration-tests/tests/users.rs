//! Owner-only account management.

use axum::http::StatusCode;
use serde_json::json;

use deinshop_integration_tests::{OWNER_USERNAME, TestContext};

async fn create_editor(ctx: &TestContext, owner: &str) -> i64 {
    let response = ctx
        .post(
            "/api/admin/users",
            json!({"username": "editor", "email": "editor@dein.shop", "password": "editorpass1"}),
            Some(owner),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["data"]["username"], "editor");
    response.body["data"]["id"].as_i64().unwrap()
}

async fn login_editor(ctx: &TestContext) -> String {
    let response = ctx
        .post(
            "/api/admin/login",
            json!({"username": "editor", "password": "editorpass1"}),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    response.session_cookie().unwrap()
}

#[tokio::test]
async fn test_owner_creates_non_owner_accounts() {
    let ctx = TestContext::new().await;
    let owner = ctx.setup_owner().await;
    create_editor(&ctx, &owner).await;

    let users = ctx.get("/api/admin/users", Some(&owner)).await;
    assert_eq!(users.status, StatusCode::OK);
    let list = users.body["data"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|user| user.get("passwordHash").is_none()));

    let editor = login_editor(&ctx).await;
    let me = ctx.get("/api/admin/me", Some(&editor)).await;
    assert_eq!(me.body["data"]["username"], "editor");
    assert_eq!(me.body["data"]["isOwner"], false);
}

#[tokio::test]
async fn test_duplicate_and_invalid_accounts_are_refused() {
    let ctx = TestContext::new().await;
    let owner = ctx.setup_owner().await;

    let duplicate = ctx
        .post(
            "/api/admin/users",
            json!({"username": OWNER_USERNAME, "email": "other@dein.shop", "password": "longenough2"}),
            Some(&owner),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let weak = ctx
        .post(
            "/api/admin/users",
            json!({"username": "editor", "email": "editor@dein.shop", "password": "short"}),
            Some(&owner),
        )
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_owner_cannot_manage_accounts() {
    let ctx = TestContext::new().await;
    let owner = ctx.setup_owner().await;
    create_editor(&ctx, &owner).await;
    let editor = login_editor(&ctx).await;

    let list = ctx.get("/api/admin/users", Some(&editor)).await;
    assert_eq!(list.status, StatusCode::FORBIDDEN);

    let create = ctx
        .post(
            "/api/admin/users",
            json!({"username": "third", "email": "third@dein.shop", "password": "thirdpass1"}),
            Some(&editor),
        )
        .await;
    assert_eq!(create.status, StatusCode::FORBIDDEN);

    let dashboard = ctx.get("/api/admin/stats", Some(&editor)).await;
    assert_eq!(dashboard.status, StatusCode::OK);
}

#[tokio::test]
async fn test_owner_cannot_delete_themselves() {
    let ctx = TestContext::new().await;
    let owner = ctx.setup_owner().await;
    let me = ctx.get("/api/admin/me", Some(&owner)).await;
    let id = me.body["data"]["id"].as_i64().unwrap();

    let response = ctx
        .delete(&format!("/api/admin/users/{id}"), Some(&owner))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_message(), "Cannot delete yourself");
}

#[tokio::test]
async fn test_deleting_an_account_ends_its_sessions() {
    let ctx = TestContext::new().await;
    let owner = ctx.setup_owner().await;
    let id = create_editor(&ctx, &owner).await;
    let editor = login_editor(&ctx).await;

    let deleted = ctx
        .delete(&format!("/api/admin/users/{id}"), Some(&owner))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["data"]["message"], "User deleted");

    let me = ctx.get("/api/admin/me", Some(&editor)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    let missing = ctx
        .delete(&format!("/api/admin/users/{id}"), Some(&owner))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
