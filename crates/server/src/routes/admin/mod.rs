//! Admin API handlers.
//!
//! Everything except setup and login requires a session cookie; user
//! management additionally requires the owner flag.
//!
//! # Route Structure
//!
//! ```text
//! GET    /setup                      - Whether first-run setup is still open
//! POST   /setup                      - Create the first (owner) admin
//! POST   /login                      - Start a session (rate limited)
//! POST   /logout                     - End the current session
//! GET    /me                         - Current admin
//!
//! GET    /stats                      - Dashboard counts
//!
//! GET    /submissions?status=        - Moderation queue
//! PATCH  /submissions/{id}           - Approve or reject
//!
//! GET    /shops                      - All shops, active or not
//! POST   /shops                      - Create shop
//! PUT    /shops/{id}                 - Update shop
//! DELETE /shops/{id}                 - Delete shop and its reports
//!
//! GET    /categories                 - All categories with shop counts
//! POST   /categories                 - Create category
//! PUT    /categories/{id}            - Update category
//! DELETE /categories/{id}            - Delete category
//! POST   /categories/{id}/image      - Upload cover image (multipart `image`)
//! DELETE /categories/{id}/image      - Remove cover image
//!
//! GET    /dead-link-reports          - Report counts per shop
//!
//! GET    /unsplash/search?q=&page=   - Photo search proxy
//! POST   /unsplash/download          - Download tracking ping
//!
//! GET    /users                      - Admin accounts (owner only)
//! POST   /users                      - Create admin (owner only)
//! DELETE /users/{id}                 - Delete admin (owner only)
//! ```

pub mod auth;
pub mod categories;
pub mod photos;
pub mod reports;
pub mod shops;
pub mod stats;
pub mod submissions;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderName,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
};

use crate::middleware::{RateLimitRule, RateLimiter, rate_limit_middleware};
use crate::services::images::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// A single `Set-Cookie` header to send along with a response body.
pub type SetCookie = [(HeaderName, String); 1];

/// Multipart framing allowance on top of the image itself.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the admin router, mounted at `/api/admin`.
pub fn routes(state: &AppState) -> Router<AppState> {
    let login_limiter = RateLimiter::new(state.rate_limits(), RateLimitRule::LOGIN);

    Router::new()
        // Auth
        .route("/setup", get(auth::setup_status).post(auth::setup))
        .route(
            "/login",
            post(auth::login).route_layer(from_fn_with_state(login_limiter, rate_limit_middleware)),
        )
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        // Dashboard
        .route("/stats", get(stats::dashboard))
        // Moderation
        .route("/submissions", get(submissions::index))
        .route("/submissions/{id}", patch(submissions::review))
        // Shops
        .route("/shops", get(shops::index).post(shops::create))
        .route(
            "/shops/{id}",
            put(shops::update).patch(shops::update).delete(shops::destroy),
        )
        // Categories
        .route("/categories", get(categories::index).post(categories::create))
        .route(
            "/categories/{id}",
            put(categories::update)
                .patch(categories::update)
                .delete(categories::destroy),
        )
        .route(
            "/categories/{id}/image",
            post(categories::upload_image)
                .delete(categories::remove_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + UPLOAD_OVERHEAD_BYTES)),
        )
        // Reports
        .route("/dead-link-reports", get(reports::index))
        // Photo search
        .route("/unsplash/search", get(photos::search))
        .route("/unsplash/download", post(photos::track_download))
        // Users (owner only)
        .route("/users", get(users::index).post(users::create))
        .route("/users/{id}", delete(users::destroy))
}
