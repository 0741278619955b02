//! # Middleware Module
//!
//! Rate limiting for the stagegate HTTP API.
//!
//! ## Configuration
//!
//! - `STAGEGATE_RATE_LIMIT`: Requests per second (default: 100, 0 disables)

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Default rate limit in requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

const DEFAULT_RPS: NonZeroU32 = match NonZeroU32::new(DEFAULT_RATE_LIMIT) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

/// Process-wide rate limiter.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Build a rate limiter; `0` falls back to the default rate.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(DEFAULT_RPS);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// Parse a rate limit setting, falling back to the default when absent or invalid.
pub fn parse_rate_limit(value: Option<&str>) -> u32 {
    value
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RATE_LIMIT)
}

/// Read `STAGEGATE_RATE_LIMIT`.
pub fn get_rate_limit_from_env() -> u32 {
    parse_rate_limit(std::env::var("STAGEGATE_RATE_LIMIT").ok().as_deref())
}

/// Reject with 429 when the global limiter has no capacity.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    match limiter.check() {
        Ok(()) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
            Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
