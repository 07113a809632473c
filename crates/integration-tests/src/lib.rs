//! End-to-end test harness for the dein.shop API.
//!
//! Each [`TestContext`] runs the full router (middleware included) against a
//! private in-memory database and a temporary image directory. Requests go
//! through `tower::ServiceExt::oneshot`, so no port is bound.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p deinshop-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used, clippy::unwrap_used)]

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use deinshop_server::config::ServerConfig;
use deinshop_server::db::{self, MIGRATOR};
use deinshop_server::middleware::MemoryRateLimitStore;
use deinshop_server::services::{Notification, Notifier};
use deinshop_server::{AppState, app};

pub const OWNER_USERNAME: &str = "admin";
pub const OWNER_PASSWORD: &str = "longenough1";

/// Notifier that keeps every accepted notification for inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) -> bool {
        self.sent.lock().unwrap().push(notification);
        true
    }
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body, or `Value::String` for non-JSON bodies.
    pub body: Value,
}

impl TestResponse {
    /// The `name=value` pair of the session cookie set by this response.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("session="))
            .and_then(|value| value.split(';').next())
            .map(str::to_owned)
    }

    pub fn error_message(&self) -> &str {
        self.body["error"]["message"].as_str().unwrap_or_default()
    }
}

pub struct TestContext {
    pub app: Router,
    pub pool: SqlitePool,
    pub notifier: Arc<RecordingNotifier>,
    pub images: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let pool = db::create_memory_pool().await.expect("in-memory pool");
        MIGRATOR.run(&pool).await.expect("migrations");

        let images = TempDir::new().expect("image dir");
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(
            test_config(images.path().to_path_buf()),
            pool.clone(),
            notifier.clone(),
            Arc::new(MemoryRateLimitStore::new()),
        )
        .expect("app state");

        Self {
            app: app(state),
            pool,
            notifier,
            images,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.expect("infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, None, cookie)).await
    }

    pub async fn post(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.send(request(Method::POST, uri, Some(body), cookie)).await
    }

    pub async fn put(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.send(request(Method::PUT, uri, Some(body), cookie)).await
    }

    pub async fn patch(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.send(request(Method::PATCH, uri, Some(body), cookie)).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request(Method::DELETE, uri, None, cookie)).await
    }

    /// Run first-time setup and return the owner's session cookie.
    pub async fn setup_owner(&self) -> String {
        let response = self
            .post(
                "/api/admin/setup",
                json!({
                    "username": OWNER_USERNAME,
                    "email": "admin@dein.shop",
                    "password": OWNER_PASSWORD,
                }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.session_cookie().expect("session cookie")
    }

    /// Create a category through the admin API and return its ID.
    pub async fn create_category(&self, cookie: &str, name: &str, slug: &str) -> i64 {
        let response = self
            .post(
                "/api/admin/categories",
                json!({"name": name, "slug": slug}),
                Some(cookie),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"]["id"].as_i64().expect("category id")
    }

    /// Create a shop through the admin API and return its ID.
    pub async fn create_shop(&self, cookie: &str, shop: Value) -> i64 {
        let response = self.post("/api/admin/shops", shop, Some(cookie)).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"]["id"].as_i64().expect("shop id")
    }

    /// Store a public submission and return its ID.
    pub async fn submit(&self, body: Value) -> i64 {
        let response = self.post("/api/submissions", body, None).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        sqlx::query_scalar("SELECT MAX(id) FROM submissions")
            .fetch_one(&self.pool)
            .await
            .expect("submission id")
    }

    pub fn image_path(&self, file_name: &str) -> PathBuf {
        self.images.path().join(file_name)
    }
}

/// Build a request with an optional JSON body and session cookie.
pub fn request(method: Method, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// Build a multipart upload with a single file field.
pub fn multipart_request(
    uri: &str,
    field: &str,
    content_type: &str,
    bytes: &[u8],
    cookie: &str,
) -> Request<Body> {
    const BOUNDARY: &str = "deinshop-test-boundary";

    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

fn test_config(image_path: PathBuf) -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "http://localhost:3000".to_owned(),
        site_url: "https://dein.shop".to_owned(),
        cors_origins: vec!["http://localhost:5173".to_owned()],
        image_path,
        ip_hash_salt: None,
        email: None,
        photo_search: None,
        outbound_timeout: Duration::from_secs(2),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        log_json: false,
    }
}
