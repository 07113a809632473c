//! Fixed-window rate limiting keyed by request path and client IP.
//!
//! Counters live behind the [`RateLimitStore`] trait. The default
//! [`MemoryRateLimitStore`] keeps them in a bounded `moka` cache, so limits
//! apply per process; a shared store can be injected for multi-instance
//! deployments.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{Extensions, HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use moka::sync::Cache;

use crate::error::AppError;

/// Upper bound on tracked `(path, ip)` keys.
const MAX_TRACKED_KEYS: u64 = 100_000;

/// Entries idle longer than the longest window are dropped.
const ENTRY_TTL: Duration = Duration::from_secs(60 * 60);

/// Key used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

// =============================================================================
// Rules
// =============================================================================

/// How many requests a client may make per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitRule {
    /// Public shop submissions: 5 per hour.
    pub const SUBMISSIONS: Self = Self {
        max_requests: 5,
        window: Duration::from_secs(60 * 60),
    };

    /// Admin login attempts: 10 per 15 minutes.
    pub const LOGIN: Self = Self {
        max_requests: 10,
        window: Duration::from_secs(15 * 60),
    };

    /// Dead-link reports: 10 per hour.
    pub const DEAD_LINK_REPORTS: Self = Self {
        max_requests: 10,
        window: Duration::from_secs(60 * 60),
    };
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

// =============================================================================
// Stores
// =============================================================================

/// Counter storage for the rate limiter.
pub trait RateLimitStore: Send + Sync {
    /// Count a request for `key` at `now` and decide whether it may proceed.
    fn hit(&self, key: &str, rule: RateLimitRule, now: Instant) -> RateLimitDecision;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: Instant,
}

/// In-process store backed by a size- and time-bounded cache.
#[derive(Clone)]
pub struct MemoryRateLimitStore {
    windows: Cache<String, Window>,
}

impl MemoryRateLimitStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            windows: Cache::builder()
                .max_capacity(MAX_TRACKED_KEYS)
                .time_to_live(ENTRY_TTL)
                .build(),
        }
    }
}

impl Default for MemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    fn hit(&self, key: &str, rule: RateLimitRule, now: Instant) -> RateLimitDecision {
        let entry = self
            .windows
            .entry(key.to_owned())
            .and_upsert_with(|existing| match existing.map(|e| e.into_value()) {
                Some(window) if now <= window.resets_at => Window {
                    count: window.count.saturating_add(1),
                    ..window
                },
                _ => Window {
                    count: 1,
                    resets_at: now + rule.window,
                },
            });

        let window = entry.into_value();
        if window.count > rule.max_requests {
            RateLimitDecision::Limited {
                retry_after: window.resets_at.saturating_duration_since(now),
            }
        } else {
            RateLimitDecision::Allowed {
                remaining: rule.max_requests - window.count,
            }
        }
    }
}

// =============================================================================
// Client IP
// =============================================================================

/// Resolve the client address from proxy headers, then the socket peer.
///
/// Checks Cloudflare's `CF-Connecting-IP` first, then the first
/// `X-Forwarded-For` entry, then `X-Real-IP`.
#[must_use]
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> String {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };

    header_ip("cf-connecting-ip")
        .or_else(|| header_ip("x-forwarded-for"))
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .map_or_else(|| UNKNOWN_CLIENT.to_owned(), |ip| ip.to_string())
}

/// Extractor for the resolved client address, see [`client_ip`].
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip(&parts.headers, &parts.extensions)))
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// State for [`rate_limit_middleware`]: a store plus the rule for one route.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    rule: RateLimitRule,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn RateLimitStore>, rule: RateLimitRule) -> Self {
        Self { store, rule }
    }
}

/// Reject the request with 429 once its `(path, ip)` key exceeds the rule.
///
/// # Errors
///
/// Returns `AppError::RateLimited` with a `Retry-After` hint.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(request.headers(), request.extensions());
    let key = format!("{}:{ip}", request.uri().path());

    match limiter.store.hit(&key, limiter.rule, Instant::now()) {
        RateLimitDecision::Allowed { .. } => Ok(next.run(request).await),
        RateLimitDecision::Limited { retry_after } => {
            tracing::warn!(key = %key, "Rate limit exceeded");
            Err(AppError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            })
        }
    }
}
