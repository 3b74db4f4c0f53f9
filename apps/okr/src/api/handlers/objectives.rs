//! Objective endpoints.

use crate::api::AppState;
use crate::api::auth::AuthUser;
use crate::api::error::{ApiJson, ApiPath, ApiResult};
use crate::api::types::{
    Directory, MessageResponse, ObjectiveDetailResponse, ObjectiveJson, ObjectiveQuery,
    ObjectiveRequest, ObjectiveUpdateRequest,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use okr_core::ObjectiveId;

/// `GET /api/objectives?quarter=&year=&type=&department=&team=&owner=`.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<ObjectiveQuery>,
) -> ApiResult<Json<Vec<ObjectiveJson>>> {
    let filter = query.to_filter()?;
    let tracker = state.tracker.read().await;
    let views = tracker.objectives(&filter)?;
    let directory = Directory::load(&tracker)?;
    Ok(Json(
        views
            .iter()
            .map(|view| ObjectiveJson::with_key_results(view, &directory))
            .collect(),
    ))
}

pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiPath(id): ApiPath<u64>,
) -> ApiResult<Json<ObjectiveDetailResponse>> {
    let tracker = state.tracker.read().await;
    let view = tracker.objective(ObjectiveId(id))?;
    let directory = Directory::load(&tracker)?;
    Ok(Json(ObjectiveDetailResponse::new(&view, &directory)))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<ObjectiveRequest>,
) -> ApiResult<(StatusCode, Json<ObjectiveJson>)> {
    let mut tracker = state.tracker.write().await;
    let objective = tracker.create_objective(&user, &request.to_new_objective())?;
    let directory = Directory::load(&tracker)?;
    Ok((
        StatusCode::CREATED,
        Json(ObjectiveJson::new(&objective, &directory)),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<u64>,
    ApiJson(request): ApiJson<ObjectiveUpdateRequest>,
) -> ApiResult<Json<ObjectiveJson>> {
    let mut tracker = state.tracker.write().await;
    let objective = tracker.update_objective(&user, ObjectiveId(id), &request.to_patch())?;
    let directory = Directory::load(&tracker)?;
    Ok(Json(ObjectiveJson::new(&objective, &directory)))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<u64>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .tracker
        .write()
        .await
        .delete_objective(&user, ObjectiveId(id))?;
    Ok(Json(MessageResponse::new("Objective and key results deleted")))
}
