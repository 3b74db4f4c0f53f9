//! Department endpoints. Writes are admin only.

use crate::api::AppState;
use crate::api::auth::AuthUser;
use crate::api::error::{ApiJson, ApiPath, ApiResult};
use crate::api::types::{DepartmentJson, DepartmentRequest, Directory, ManagerRequest};
use axum::{Json, extract::State, http::StatusCode};
use okr_core::{DepartmentId, UserId};

pub async fn list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> ApiResult<Json<Vec<DepartmentJson>>> {
    let tracker = state.tracker.read().await;
    let directory = Directory::load(&tracker)?;
    Ok(Json(
        tracker
            .departments()?
            .iter()
            .map(|d| DepartmentJson::new(d, &directory))
            .collect(),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<DepartmentRequest>,
) -> ApiResult<(StatusCode, Json<DepartmentJson>)> {
    let mut tracker = state.tracker.write().await;
    let department = tracker.create_department(&user, &request.to_new_department())?;
    let directory = Directory::load(&tracker)?;
    Ok((
        StatusCode::CREATED,
        Json(DepartmentJson::new(&department, &directory)),
    ))
}

/// `PATCH /api/departments/{id}/manager {managerId}`; blank clears.
pub async fn set_manager(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<u64>,
    ApiJson(request): ApiJson<ManagerRequest>,
) -> ApiResult<Json<DepartmentJson>> {
    let mut tracker = state.tracker.write().await;
    let department = tracker.set_department_manager(
        &user,
        DepartmentId(id),
        request.manager_id.map(UserId),
    )?;
    let directory = Directory::load(&tracker)?;
    Ok(Json(DepartmentJson::new(&department, &directory)))
}
