//! Sign-in and token verification.

use crate::api::AppState;
use crate::api::auth::AuthUser;
use crate::api::error::{ApiError, ApiJson, ApiResult};
use crate::api::types::{
    Directory, GithubCallbackQuery, OktaCallbackRequest, TokenResponse, UserJson, VerifyResponse,
};
use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// 302 to `location`.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn login_page(state: &AppState) -> Response {
    found(format!("{}/login", state.config.frontend_base()))
}

/// `GET /api/auth/github`: send the browser to GitHub.
pub async fn github_login(State(state): State<AppState>) -> ApiResult<Response> {
    let Some(github) = &state.github else {
        return Err(ApiError::unavailable("GitHub sign-in is not configured"));
    };
    let url = github.authorize_url().map_err(|e| {
        tracing::error!(error = %e, "cannot build GitHub authorize URL");
        ApiError::unavailable("GitHub sign-in is not configured")
    })?;
    Ok(found(url))
}

/// `GET /api/auth/github/callback?code=`: finish the GitHub flow and hand
/// the web client a token. Any failure lands on the login page.
pub async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<GithubCallbackQuery>,
) -> Response {
    let Some(github) = state.github.clone() else {
        tracing::warn!(event = "auth_failure", reason = "github_not_configured");
        return login_page(&state);
    };
    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        tracing::warn!(
            event = "auth_failure",
            reason = "github_denied",
            error = query.error.as_deref().unwrap_or("missing code"),
        );
        return login_page(&state);
    };

    let profile = match github.sign_in(&code).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(event = "auth_failure", reason = "github_exchange", error = %e);
            return login_page(&state);
        }
    };

    let user = state.tracker.write().await.find_or_create_github_user(&profile);
    let token = user.map_err(|e| e.to_string()).and_then(|user| {
        state
            .tokens
            .issue(user.id)
            .map_err(|e| e.to_string())
    });
    match token {
        Ok(token) => found(format!(
            "{}/auth/callback?token={}",
            state.config.frontend_base(),
            token
        )),
        Err(e) => {
            tracing::warn!(event = "auth_failure", reason = "github_user", error = %e);
            login_page(&state)
        }
    }
}

/// `POST /api/auth/okta/callback`: the web client completed Okta sign-in
/// and posts the resulting profile.
pub async fn okta_callback(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OktaCallbackRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let mut tracker = state.tracker.write().await;
    let user = tracker.find_or_create_okta_user(&request.to_profile())?;
    let token = state.tokens.issue(user.id).map_err(|e| {
        tracing::error!(error = %e, "cannot issue token");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Cannot issue token")
    })?;
    let directory = Directory::load(&tracker)?;
    Ok(Json(TokenResponse {
        token,
        user: UserJson::new(&user, &directory),
    }))
}

/// `GET /api/auth/verify`.
pub async fn verify(AuthUser(user): AuthUser) -> Json<VerifyResponse> {
    Json(VerifyResponse::from(&user))
}
