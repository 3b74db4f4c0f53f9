//! Key result endpoints. Every write needs the parent objective's owner or
//! an admin.

use crate::api::AppState;
use crate::api::auth::AuthUser;
use crate::api::error::{ApiJson, ApiPath, ApiResult};
use crate::api::types::{
    ConfidenceRequest, KeyResultJson, KeyResultRequest, KeyResultUpdateRequest, MessageResponse,
};
use axum::{Json, extract::State, http::StatusCode};
use okr_core::{KeyResultId, ObjectiveId};

/// `GET /api/key-results/objective/{objective_id}`. An unknown objective
/// simply has no key results.
pub async fn list_for_objective(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiPath(objective_id): ApiPath<u64>,
) -> ApiResult<Json<Vec<KeyResultJson>>> {
    let key_results = state
        .tracker
        .read()
        .await
        .key_results_for(ObjectiveId(objective_id))?;
    Ok(Json(key_results.iter().map(Into::into).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<KeyResultRequest>,
) -> ApiResult<(StatusCode, Json<KeyResultJson>)> {
    let key_result = state
        .tracker
        .write()
        .await
        .create_key_result(&user, &request.to_new_key_result())?;
    Ok((StatusCode::CREATED, Json((&key_result).into())))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<u64>,
    ApiJson(request): ApiJson<KeyResultUpdateRequest>,
) -> ApiResult<Json<KeyResultJson>> {
    let key_result = state
        .tracker
        .write()
        .await
        .update_key_result(&user, KeyResultId(id), &request.to_patch())?;
    tracing::debug!(
        key_result = id,
        progress = key_result.progress,
        status = key_result.status.as_str(),
        "key result updated"
    );
    Ok(Json((&key_result).into()))
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
        .delete_key_result(&user, KeyResultId(id))?;
    Ok(Json(MessageResponse::new("Key Result deleted successfully")))
}

/// `PATCH /api/key-results/{id}/confidence {confidenceLevel, note}`.
pub async fn update_confidence(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<u64>,
    ApiJson(request): ApiJson<ConfidenceRequest>,
) -> ApiResult<Json<KeyResultJson>> {
    let key_result = state.tracker.write().await.update_confidence(
        &user,
        KeyResultId(id),
        request.confidence_level,
        request.note.as_deref(),
    )?;
    Ok(Json((&key_result).into()))
}
