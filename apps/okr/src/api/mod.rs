//! # OKR HTTP API Module
//!
//! This module implements the HTTP REST API server using axum. Every route
//! lives under `/api`.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `GET /api/auth/github`, `GET /api/auth/github/callback` - GitHub sign-in
//! - `POST /api/auth/okta/callback` - Okta sign-in
//! - `GET /api/auth/verify` - Who am I
//! - `/api/objectives`, `/api/key-results` - Objectives and their key results
//! - `/api/departments`, `/api/teams`, `/api/users` - Organization
//!
//! All routes except health and sign-in require `Authorization: Bearer <jwt>`.
//!
//! ## Security Configuration
//!
//! See [`crate::config`]: `OKR_CORS_ORIGINS`, `OKR_RATE_LIMIT`,
//! `OKR_JWT_SECRET`.

pub mod auth;
pub mod error;
pub mod github;
pub mod handlers;
pub mod middleware;
pub mod token;
pub mod types;

pub use auth::AuthUser;
pub use error::{ApiError, ApiJson, ApiPath, ApiResult, ErrorResponse};
pub use github::{GithubClient, GithubError};
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use token::{Claims, TokenError, TokenIssuer};

use crate::config::ServerConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use okr_core::{OkrError, Tracker};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum accepted request body.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<RwLock<Tracker>>,
    pub tokens: Arc<TokenIssuer>,
    /// `None` when no GitHub application is configured.
    pub github: Option<Arc<GithubClient>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Fails without a JWT secret or with an invalid configuration.
    pub fn new(tracker: Tracker, config: ServerConfig) -> Result<Self, OkrError> {
        config.validate()?;
        let tokens = TokenIssuer::new(config.require_jwt_secret()?, config.token_ttl_days);
        let github = GithubClient::from_config(&config.github)
            .map_err(|e| OkrError::Config(e.to_string()))?
            .map(Arc::new);
        if github.is_none() {
            tracing::warn!("GitHub sign-in disabled: GITHUB_CLIENT_ID/GITHUB_CLIENT_SECRET not set");
        }

        Ok(Self {
            tracker: Arc::new(RwLock::new(tracker)),
            tokens: Arc::new(tokens),
            github,
            config: Arc::new(config),
        })
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer from `cors_origins`:
/// - `*`: allows all origins
/// - unset: localhost only
/// - otherwise: a comma-separated list of allowed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins.map(str::trim) {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (OKR_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) if !trimmed.is_empty() => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Ok(_) => None,
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in OKR_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(CORS_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No OKR_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:4000",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:4000",
    ]
    .into_iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Last-resort 500 for a panicking handler.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "handler panicked");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. Panic catcher - unhandled panics become 500 `{error}`
/// 3. CORS - handles preflight requests
/// 4. Body limit
/// 5. Rate Limiting - protects against DoS (if enabled)
///
/// Authentication is per handler through the [`AuthUser`] extractor.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(state.config.cors_origins.as_deref());

    let rate_limit = state.config.rate_limit;
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let api = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/auth/github", get(handlers::auth::github_login))
        .route("/auth/github/callback", get(handlers::auth::github_callback))
        .route("/auth/okta/callback", post(handlers::auth::okta_callback))
        .route("/auth/verify", get(handlers::auth::verify))
        .route(
            "/objectives",
            get(handlers::objectives::list).post(handlers::objectives::create),
        )
        .route(
            "/objectives/{id}",
            get(handlers::objectives::get_one)
                .put(handlers::objectives::update)
                .delete(handlers::objectives::delete),
        )
        .route("/key-results", post(handlers::key_results::create))
        .route(
            "/key-results/objective/{objective_id}",
            get(handlers::key_results::list_for_objective),
        )
        .route(
            "/key-results/{id}",
            put(handlers::key_results::update).delete(handlers::key_results::delete),
        )
        .route(
            "/key-results/{id}/confidence",
            patch(handlers::key_results::update_confidence),
        )
        .route(
            "/departments",
            get(handlers::departments::list).post(handlers::departments::create),
        )
        .route(
            "/departments/{id}/manager",
            patch(handlers::departments::set_manager),
        )
        .route(
            "/teams",
            get(handlers::teams::list).post(handlers::teams::create),
        )
        .route("/teams/{id}/lead", patch(handlers::teams::set_lead))
        .route("/teams/{id}/members", patch(handlers::teams::set_members))
        .route("/users", get(handlers::users::list))
        .route(
            "/users/{id}",
            get(handlers::users::get_one)
                .patch(handlers::users::update)
                .delete(handlers::users::delete),
        );

    let mut router = Router::new()
        .nest("/api", api)
        .fallback(handlers::not_found_handler);

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(config: ServerConfig, tracker: Tracker) -> Result<(), OkrError> {
    let addr = config.bind_address();
    let state = AppState::new(tracker, config)?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| OkrError::Config(format!("Bind failed on {}: {}", addr, e)))?;

    tracing::info!("OKR HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| OkrError::Config(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

// =============================================================================
// TESTS
// =============================================================================
