//! HTTP routes for the directory.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness
//! GET  /health/ready               - Readiness (database)
//! GET  /uploads/{file}             - Uploaded category images
//!
//! # Public API
//! GET  /api/categories             - Categories with active shop counts
//! GET  /api/categories/{slug}      - Category with its active shops
//! GET  /api/shops                  - Active shops
//! GET  /api/search?q=              - Shop and category search
//! POST /api/submissions            - Propose a shop (rate limited)
//! POST /api/shops/{id}/report      - Report a dead link (rate limited)
//!
//! # Admin API
//! /api/admin/...                   - See [`admin`]
//! ```

pub mod admin;
pub mod health;
pub mod public;

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, Response, header::CONTENT_TYPE},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{
    RateLimitRule, RateLimiter, rate_limit_middleware, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Build the public API router, mounted at `/api`.
pub fn public_routes(state: &AppState) -> Router<AppState> {
    let submission_limiter = RateLimiter::new(state.rate_limits(), RateLimitRule::SUBMISSIONS);
    let report_limiter = RateLimiter::new(state.rate_limits(), RateLimitRule::DEAD_LINK_REPORTS);

    Router::new()
        .route("/categories", get(public::list_categories))
        .route("/categories/{slug}", get(public::show_category))
        .route("/shops", get(public::list_shops))
        .route("/search", get(public::search))
        .route(
            "/submissions",
            post(public::create_submission)
                .route_layer(from_fn_with_state(submission_limiter, rate_limit_middleware)),
        )
        .route(
            "/shops/{id}/report",
            post(public::report_dead_link)
                .route_layer(from_fn_with_state(report_limiter, rate_limit_middleware)),
        )
}

/// Build the complete application with its middleware stack.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    let api = public_routes(&state).nest("/admin", admin::routes(&state));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(state.images().dir()))
        .fallback(not_found)
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config().cors_origins))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        admin_user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<Body>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

/// CORS for the public site and the admin UI. Credentials are allowed so the
/// session cookie travels with admin requests.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(600))
}
