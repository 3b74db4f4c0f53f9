//! # Authentication Module
//!
//! Bearer-token authentication for the OKR HTTP API.
//!
//! Handlers that need a signed-in user take an [`AuthUser`] argument:
//! ```text
//! Authorization: Bearer <jwt>
//! ```
//! The token must verify, and its user must still exist and be active.
//! Every rejection is a 401 and is logged with `event = "auth_failure"`.

use super::AppState;
use super::error::ApiError;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use okr_core::{User, UserId};

/// The user behind a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                path = %parts.uri.path(),
                "Missing bearer token"
            );
            return Err(ApiError::unauthorized("No token provided"));
        };

        let claims = state.tokens.verify(token).map_err(|e| {
            tracing::warn!(
                event = "auth_failure",
                reason = e.reason(),
                path = %parts.uri.path(),
                "Authentication failed: {}",
                e
            );
            ApiError::unauthorized("Invalid token")
        })?;

        let user = state.tracker.read().await.find_user(UserId(claims.id))?;
        match user {
            Some(user) if user.is_active => Ok(Self(user)),
            Some(_) => {
                tracing::warn!(event = "auth_failure", reason = "inactive_user", user = claims.id);
                Err(ApiError::unauthorized("User account is inactive"))
            }
            None => {
                tracing::warn!(event = "auth_failure", reason = "unknown_user", user = claims.id);
                Err(ApiError::unauthorized("User not found"))
            }
        }
    }
}

/// Token from `Authorization: Bearer <token>`; the scheme is
/// case-insensitive.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

// =============================================================================
// TESTS
// =============================================================================
