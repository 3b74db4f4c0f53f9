//! User endpoints. Listing and writes are admin only.

use crate::api::AppState;
use crate::api::auth::AuthUser;
use crate::api::error::{ApiJson, ApiPath, ApiResult};
use crate::api::types::{Directory, MessageResponse, UserJson, UserUpdateRequest};
use axum::{Json, extract::State};
use okr_core::{UserId, access};

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<UserJson>>> {
    access::ensure_admin(&user)?;
    let tracker = state.tracker.read().await;
    let directory = Directory::load(&tracker)?;
    Ok(Json(
        tracker
            .users()?
            .iter()
            .map(|u| UserJson::new(u, &directory))
            .collect(),
    ))
}

pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiPath(id): ApiPath<u64>,
) -> ApiResult<Json<UserJson>> {
    let tracker = state.tracker.read().await;
    let user = tracker.user(UserId(id))?;
    let directory = Directory::load(&tracker)?;
    Ok(Json(UserJson::new(&user, &directory)))
}

/// `PATCH /api/users/{id} {isAdmin, role, department, team}`.
pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<u64>,
    ApiJson(request): ApiJson<UserUpdateRequest>,
) -> ApiResult<Json<UserJson>> {
    let mut tracker = state.tracker.write().await;
    let user = tracker.update_user(&actor, UserId(id), &request.to_patch())?;
    let directory = Directory::load(&tracker)?;
    Ok(Json(UserJson::new(&user, &directory)))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<u64>,
) -> ApiResult<Json<MessageResponse>> {
    state.tracker.write().await.delete_user(&actor, UserId(id))?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
