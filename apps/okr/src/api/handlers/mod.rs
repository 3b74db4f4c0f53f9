//! # API Endpoint Handlers
//!
//! One submodule per resource. Handlers take the write lock only for the
//! duration of the tracker call and build response bodies from a
//! [`Directory`](super::types::Directory) snapshot.

pub mod auth;
pub mod departments;
pub mod key_results;
pub mod objectives;
pub mod teams;
pub mod users;

use super::error::ApiError;
use super::types::HealthResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Any path no route matches.
pub async fn not_found_handler() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not found")
}
