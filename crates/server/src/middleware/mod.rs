//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded in the span, echoed in the response)
//! 4. CORS
//! 5. Security headers
//! 6. Rate limiting (per route, via `route_layer`)
//!
//! Authentication is not a layer: admin handlers take the [`RequireAdmin`] or
//! [`RequireOwner`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{RequireAdmin, RequireOwner, removal_cookie, session_cookie, session_token};
pub use rate_limit::{
    MemoryRateLimitStore, RateLimitRule, RateLimitStore, RateLimiter, client_ip,
    rate_limit_middleware,
};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
