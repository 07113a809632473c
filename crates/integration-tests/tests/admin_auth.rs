//! Setup, login, logout and session expiry.

use axum::http::{StatusCode, header};
use chrono::{Duration, Utc};
use serde_json::json;

use deinshop_integration_tests::{OWNER_PASSWORD, OWNER_USERNAME, TestContext};

// =============================================================================
// Setup
// =============================================================================

#[tokio::test]
async fn test_setup_creates_owner_once() {
    let ctx = TestContext::new().await;

    let status = ctx.get("/api/admin/setup", None).await;
    assert_eq!(status.body["data"]["needsSetup"], true);

    let response = ctx
        .post(
            "/api/admin/setup",
            json!({"username": "admin", "email": "a@b.com", "password": "longenough1"}),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["isOwner"], true);
    assert_eq!(response.body["data"]["username"], "admin");
    let set_cookie = response.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let again = ctx
        .post(
            "/api/admin/setup",
            json!({"username": "other", "email": "o@b.com", "password": "longenough1"}),
            None,
        )
        .await;
    assert_eq!(again.status, StatusCode::FORBIDDEN);
    assert_eq!(again.error_message(), "Setup already completed");

    let status = ctx.get("/api/admin/setup", None).await;
    assert_eq!(status.body["data"]["needsSetup"], false);
}

#[tokio::test]
async fn test_setup_session_is_logged_in() {
    let ctx = TestContext::new().await;
    let cookie = ctx.setup_owner().await;

    let me = ctx.get("/api/admin/me", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["username"], OWNER_USERNAME);
    assert!(me.body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_setup_validates_input() {
    let ctx = TestContext::new().await;
    let response = ctx
        .post(
            "/api/admin/setup",
            json!({"username": "admin", "email": "a@b.com", "password": "short"}),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let status = ctx.get("/api/admin/setup", None).await;
    assert_eq!(status.body["data"]["needsSetup"], true);
}

// =============================================================================
// Login / Logout
// =============================================================================

#[tokio::test]
async fn test_login_and_logout() {
    let ctx = TestContext::new().await;
    ctx.setup_owner().await;

    let wrong = ctx
        .post(
            "/api/admin/login",
            json!({"username": OWNER_USERNAME, "password": "wrong-password"}),
            None,
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert!(wrong.session_cookie().is_none());

    let login = ctx
        .post(
            "/api/admin/login",
            json!({"username": OWNER_USERNAME, "password": OWNER_PASSWORD}),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let cookie = login.session_cookie().unwrap();

    let logout = ctx.post("/api/admin/logout", json!({}), Some(&cookie)).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body["data"]["message"], "Logged out");

    let me = ctx.get("/api/admin/me", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_requires_fields() {
    let ctx = TestContext::new().await;
    let response = ctx
        .post("/api/admin/login", json!({"username": "", "password": ""}), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let ctx = TestContext::new().await;
    let attempt = json!({"username": "nobody", "password": "whatever1"});

    for _ in 0..10 {
        let response = ctx.post("/api/admin/login", attempt.clone(), None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let limited = ctx.post("/api/admin/login", attempt, None).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers.contains_key(header::RETRY_AFTER));
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_admin_routes_require_session() {
    let ctx = TestContext::new().await;
    for uri in ["/api/admin/me", "/api/admin/stats", "/api/admin/submissions"] {
        let response = ctx.get(uri, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
    }

    let forged = ctx.get("/api/admin/me", Some("session=not-a-real-token")).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let ctx = TestContext::new().await;
    let cookie = ctx.setup_owner().await;

    sqlx::query("UPDATE sessions SET expires_at = ?")
        .bind(Utc::now() - Duration::hours(1))
        .execute(&ctx.pool)
        .await
        .unwrap();

    let me = ctx.get("/api/admin/me", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.body["error"]["message"], "Session expired");
}
