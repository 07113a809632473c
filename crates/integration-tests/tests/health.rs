//! Probes and the cross-cutting middleware stack.

use axum::http::{Method, StatusCode, header};

use deinshop_integration_tests::{TestContext, request};

#[tokio::test]
async fn test_health_probes() {
    let ctx = TestContext::new().await;

    let live = ctx.get("/health", None).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    let ready = ctx.get("/health/ready", None).await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers() {
    let ctx = TestContext::new().await;
    let response = ctx.get("/api/categories", None).await;

    assert_eq!(response.headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(response.headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(response.headers[header::CACHE_CONTROL], "no-store");
    assert!(response.headers.contains_key(header::CONTENT_SECURITY_POLICY));

    let probe = ctx.get("/health", None).await;
    assert!(!probe.headers.contains_key(header::CACHE_CONTROL));
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let ctx = TestContext::new().await;

    let mut upstream = request(Method::GET, "/health", None, None);
    upstream
        .headers_mut()
        .insert("x-request-id", "edge-1234".parse().unwrap());
    let echoed = ctx.send(upstream).await;
    assert_eq!(echoed.headers["x-request-id"], "edge-1234");

    let generated = ctx.get("/health", None).await;
    let id = generated.headers["x-request-id"].to_str().unwrap();
    assert!(!id.is_empty());
    assert_ne!(id, "edge-1234");
}

#[tokio::test]
async fn test_unknown_routes_answer_json() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/api/nope", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_message(), "Not found");

    let root = ctx.get("/nope", None).await;
    assert_eq!(root.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight_for_configured_origin() {
    let ctx = TestContext::new().await;

    let mut preflight = request(Method::OPTIONS, "/api/submissions", None, None);
    let headers = preflight.headers_mut();
    headers.insert(header::ORIGIN, "http://localhost:5173".parse().unwrap());
    headers.insert(header::ACCESS_CONTROL_REQUEST_METHOD, "POST".parse().unwrap());
    let response = ctx.send(preflight).await;

    assert_eq!(
        response.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(response.headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}
