//! # Middleware Module
//!
//! Global rate limiting for the OKR HTTP API.
//!
//! The limit comes from [`ServerConfig::rate_limit`](crate::config::ServerConfig)
//! (`OKR_RATE_LIMIT`); 0 disables it.

use super::error::ApiError;
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

/// Used when a zero rate reaches [`create_rate_limiter`].
const DEFAULT_RPS: NonZeroU32 = match NonZeroU32::new(100) {
    Some(rps) => rps,
    None => NonZeroU32::MIN,
};

// =============================================================================
// RATE LIMITER
// =============================================================================

/// Global rate limiter type alias.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a new global rate limiter allowing `requests_per_second`.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(DEFAULT_RPS);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// Rejects with 429 `{error}` once the global quota is spent.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    match limiter.check() {
        Ok(()) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
            Err(ApiError::new(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later",
            ))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
