//! Team endpoints. Writes are admin only.

use crate::api::AppState;
use crate::api::auth::AuthUser;
use crate::api::error::{ApiJson, ApiPath, ApiResult};
use crate::api::types::{Directory, LeadRequest, MembersRequest, TeamJson, TeamRequest};
use axum::{Json, extract::State, http::StatusCode};
use okr_core::{TeamId, UserId};

pub async fn list(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> ApiResult<Json<Vec<TeamJson>>> {
    let tracker = state.tracker.read().await;
    let directory = Directory::load(&tracker)?;
    Ok(Json(
        tracker
            .teams()?
            .iter()
            .map(|t| TeamJson::new(t, &directory))
            .collect(),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<TeamRequest>,
) -> ApiResult<(StatusCode, Json<TeamJson>)> {
    let mut tracker = state.tracker.write().await;
    let team = tracker.create_team(&user, &request.to_new_team())?;
    let directory = Directory::load(&tracker)?;
    Ok((StatusCode::CREATED, Json(TeamJson::new(&team, &directory))))
}

/// `PATCH /api/teams/{id}/lead {leadId}`; blank clears.
pub async fn set_lead(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<u64>,
    ApiJson(request): ApiJson<LeadRequest>,
) -> ApiResult<Json<TeamJson>> {
    let mut tracker = state.tracker.write().await;
    let team = tracker.set_team_lead(&user, TeamId(id), request.lead_id.map(UserId))?;
    let directory = Directory::load(&tracker)?;
    Ok(Json(TeamJson::new(&team, &directory)))
}

/// `PATCH /api/teams/{id}/members {members}` replaces the member list.
pub async fn set_members(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<u64>,
    ApiJson(request): ApiJson<MembersRequest>,
) -> ApiResult<Json<TeamJson>> {
    let mut tracker = state.tracker.write().await;
    let team = tracker.set_team_members(&user, TeamId(id), &request.user_ids())?;
    let directory = Directory::load(&tracker)?;
    Ok(Json(TeamJson::new(&team, &directory)))
}
