//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! The web client speaks camelCase and addresses documents by `_id`.
//! References in responses are expanded to `{_id, name}` (departments,
//! teams) or `{_id, name, email}` (users). Requests accept ids as numbers,
//! numeric strings, or an expanded `{_id, ...}` object echoed back from a
//! response; an empty string means "no reference".

use chrono::{DateTime, Utc};
use okr_core::{
    AuthProvider, ConfidenceEntry, ConfidenceLevel, Department, DepartmentId, KeyResult,
    KeyResultPatch, KeyResultStatus, MetricType, NewDepartment, NewKeyResult, NewObjective,
    NewTeam, Objective, ObjectiveFilter, ObjectiveId, ObjectivePatch, ObjectiveStatus,
    ObjectiveType, ObjectiveView, OkrError, OktaProfile, ProgressEntry, Role, Team, TeamId,
    Timeframe, Tracker, User, UserId, UserPatch,
};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

// =============================================================================
// SIMPLE RESPONSES
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "OK".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Confirmation body for deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// REFERENCES
// =============================================================================

/// Expanded department or team reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(rename = "_id")]
    pub id: u64,
    pub name: String,
}

/// Expanded user reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Names of every referenceable document, loaded once per response.
#[derive(Debug, Default)]
pub struct Directory {
    users: BTreeMap<UserId, UserRef>,
    departments: BTreeMap<DepartmentId, NamedRef>,
    teams: BTreeMap<TeamId, NamedRef>,
}

impl Directory {
    pub fn load(tracker: &Tracker) -> Result<Self, OkrError> {
        let users = tracker
            .users()?
            .into_iter()
            .map(|u| {
                let entry = UserRef {
                    id: u.id.0,
                    name: u.name,
                    email: u.email,
                };
                (u.id, entry)
            })
            .collect();
        let departments = tracker
            .departments()?
            .into_iter()
            .map(|d| (d.id, NamedRef { id: d.id.0, name: d.name }))
            .collect();
        let teams = tracker
            .teams()?
            .into_iter()
            .map(|t| (t.id, NamedRef { id: t.id.0, name: t.name }))
            .collect();
        Ok(Self {
            users,
            departments,
            teams,
        })
    }

    /// A dangling reference expands to `None`.
    pub fn user(&self, id: UserId) -> Option<UserRef> {
        self.users.get(&id).cloned()
    }

    pub fn department(&self, id: Option<DepartmentId>) -> Option<NamedRef> {
        id.and_then(|id| self.departments.get(&id).cloned())
    }

    pub fn team(&self, id: Option<TeamId>) -> Option<NamedRef> {
        id.and_then(|id| self.teams.get(&id).cloned())
    }
}

// =============================================================================
// DOCUMENT RESPONSES
// =============================================================================

/// A user as the API shows it. The GitHub access token is never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJson {
    #[serde(rename = "_id")]
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
    pub department: Option<NamedRef>,
    pub team: Option<NamedRef>,
    pub auth_provider: AuthProvider,
    pub github_id: Option<String>,
    pub okta_id: Option<String>,
    pub last_login: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserJson {
    pub fn new(user: &User, directory: &Directory) -> Self {
        Self {
            id: user.id.0,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_admin: user.is_admin(),
            department: directory.department(user.department),
            team: directory.team(user.team),
            auth_provider: user.auth_provider,
            github_id: user.github_id.clone(),
            okta_id: user.okta_id.clone(),
            last_login: user.last_login,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentJson {
    #[serde(rename = "_id")]
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub manager: Option<UserRef>,
}

impl DepartmentJson {
    pub fn new(department: &Department, directory: &Directory) -> Self {
        Self {
            id: department.id.0,
            name: department.name.clone(),
            description: department.description.clone(),
            manager: department.manager.and_then(|m| directory.user(m)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamJson {
    #[serde(rename = "_id")]
    pub id: u64,
    pub name: String,
    pub department: Option<NamedRef>,
    pub team_lead: Option<UserRef>,
    pub members: Vec<UserRef>,
}

impl TeamJson {
    pub fn new(team: &Team, directory: &Directory) -> Self {
        Self {
            id: team.id.0,
            name: team.name.clone(),
            department: directory.department(Some(team.department)),
            team_lead: team.team_lead.and_then(|l| directory.user(l)),
            members: team
                .members
                .iter()
                .filter_map(|m| directory.user(*m))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceEntryJson {
    pub level: ConfidenceLevel,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntryJson {
    pub value: f64,
    pub date: DateTime<Utc>,
}

impl From<&ConfidenceEntry> for ConfidenceEntryJson {
    fn from(entry: &ConfidenceEntry) -> Self {
        Self {
            level: entry.level,
            note: entry.note.clone(),
            timestamp: entry.timestamp,
        }
    }
}

impl From<&ProgressEntry> for ProgressEntryJson {
    fn from(entry: &ProgressEntry) -> Self {
        Self {
            value: entry.value,
            date: entry.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultJson {
    #[serde(rename = "_id")]
    pub id: u64,
    pub objective: u64,
    pub title: String,
    pub description: Option<String>,
    pub metric_type: MetricType,
    pub start_value: f64,
    pub target_value: f64,
    pub current_value: f64,
    pub progress: u8,
    pub status: KeyResultStatus,
    pub confidence_level: ConfidenceLevel,
    pub confidence_history: Vec<ConfidenceEntryJson>,
    pub progress_history: Vec<ProgressEntryJson>,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&KeyResult> for KeyResultJson {
    fn from(kr: &KeyResult) -> Self {
        Self {
            id: kr.id.0,
            objective: kr.objective.0,
            title: kr.title.clone(),
            description: kr.description.clone(),
            metric_type: kr.metric_type,
            start_value: kr.start_value,
            target_value: kr.target_value,
            current_value: kr.current_value,
            progress: kr.progress,
            status: kr.status,
            confidence_level: kr.confidence_level,
            confidence_history: kr.confidence_history.iter().map(Into::into).collect(),
            progress_history: kr.progress_history.iter().map(Into::into).collect(),
            unit: kr.unit.clone(),
            created_at: kr.created_at,
            updated_at: kr.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveJson {
    #[serde(rename = "_id")]
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ObjectiveType,
    pub status: ObjectiveStatus,
    pub timeframe: Timeframe,
    pub progress: u8,
    pub owner: Option<UserRef>,
    pub parent_objective: Option<u64>,
    pub department: Option<NamedRef>,
    pub team: Option<NamedRef>,
    /// Present on list responses only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_results: Option<Vec<KeyResultJson>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ObjectiveJson {
    pub fn new(objective: &Objective, directory: &Directory) -> Self {
        Self {
            id: objective.id.0,
            title: objective.title.clone(),
            description: objective.description.clone(),
            kind: objective.kind,
            status: objective.status,
            timeframe: objective.timeframe,
            progress: objective.progress,
            owner: directory.user(objective.owner),
            parent_objective: objective.parent_objective.map(|p| p.0),
            department: directory.department(objective.department),
            team: directory.team(objective.team),
            key_results: None,
            created_at: objective.created_at,
            updated_at: objective.updated_at,
        }
    }

    /// List entry: key results embedded, progress from the live rollup.
    pub fn with_key_results(view: &ObjectiveView, directory: &Directory) -> Self {
        let mut json = Self::new(&view.objective, directory);
        json.progress = view.rollup;
        json.key_results = Some(view.key_results.iter().map(Into::into).collect());
        json
    }
}

/// `GET /api/objectives/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveDetailResponse {
    pub objective: ObjectiveJson,
    pub key_results: Vec<KeyResultJson>,
}

impl ObjectiveDetailResponse {
    pub fn new(view: &ObjectiveView, directory: &Directory) -> Self {
        let mut objective = ObjectiveJson::new(&view.objective, directory);
        objective.progress = view.rollup;
        Self {
            objective,
            key_results: view.key_results.iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Issued after a successful sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserJson,
}

/// `GET /api/auth/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub user: VerifiedUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedUser {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub department: Option<u64>,
}

impl From<&User> for VerifyResponse {
    fn from(user: &User) -> Self {
        Self {
            user: VerifiedUser {
                id: user.id.0,
                email: user.email.clone(),
                name: user.name.clone(),
                role: user.role,
                department: user.department.map(|d| d.0),
            },
        }
    }
}

/// Profile the web client posts after finishing its Okta flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OktaCallbackRequest {
    pub okta_id: String,
    pub email: String,
    pub name: String,
}

impl OktaCallbackRequest {
    pub fn to_profile(&self) -> OktaProfile {
        OktaProfile {
            okta_id: self.okta_id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Query string of the GitHub OAuth callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// OBJECTIVE REQUESTS
// =============================================================================

/// `GET /api/objectives` query string. Every field is optional and blank
/// values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectiveQuery {
    pub quarter: Option<String>,
    pub year: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub department: Option<String>,
    pub team: Option<String>,
    pub owner: Option<String>,
}

impl ObjectiveQuery {
    pub fn to_filter(&self) -> Result<ObjectiveFilter, OkrError> {
        let kind = match blank_to_none(self.kind.as_deref()) {
            Some(kind) => Some(
                serde_json::from_value::<ObjectiveType>(serde_json::Value::String(
                    kind.to_string(),
                ))
                .map_err(|_| OkrError::Validation(format!("unknown objective type '{}'", kind)))?,
            ),
            None => None,
        };
        Ok(ObjectiveFilter {
            quarter: parse_param("quarter", self.quarter.as_deref())?,
            year: parse_param("year", self.year.as_deref())?,
            kind,
            department: parse_param("department", self.department.as_deref())?.map(DepartmentId),
            team: parse_param("team", self.team.as_deref())?.map(TeamId),
            owner: parse_param("owner", self.owner.as_deref())?.map(UserId),
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimeframeRequest {
    #[serde(deserialize_with = "flex")]
    pub quarter: u8,
    #[serde(deserialize_with = "flex")]
    pub year: i32,
}

impl From<TimeframeRequest> for Timeframe {
    fn from(t: TimeframeRequest) -> Self {
        Self {
            quarter: t.quarter,
            year: t.year,
        }
    }
}

/// `POST /api/objectives`. A missing owner means the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub owner: Option<u64>,
    #[serde(rename = "type")]
    pub kind: ObjectiveType,
    #[serde(default)]
    pub status: Option<ObjectiveStatus>,
    pub timeframe: TimeframeRequest,
    #[serde(default, deserialize_with = "opt_id")]
    pub parent_objective: Option<u64>,
    #[serde(default, deserialize_with = "opt_id")]
    pub department: Option<u64>,
    #[serde(default, deserialize_with = "opt_id")]
    pub team: Option<u64>,
}

impl ObjectiveRequest {
    pub fn to_new_objective(&self) -> NewObjective {
        NewObjective {
            title: self.title.clone(),
            description: self.description.clone(),
            owner: self.owner.map(UserId),
            kind: self.kind,
            status: self.status,
            timeframe: self.timeframe.into(),
            parent_objective: self.parent_objective.map(ObjectiveId),
            department: self.department.map(DepartmentId),
            team: self.team.map(TeamId),
        }
    }
}

/// `PUT /api/objectives/{id}`. Absent fields are left alone; `null` (or an
/// empty string for references) clears optional ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "opt_id")]
    pub owner: Option<u64>,
    #[serde(default, rename = "type")]
    pub kind: Option<ObjectiveType>,
    #[serde(default)]
    pub status: Option<ObjectiveStatus>,
    #[serde(default)]
    pub timeframe: Option<TimeframeRequest>,
    #[serde(default, deserialize_with = "nullable_id")]
    pub parent_objective: Option<Option<u64>>,
    #[serde(default, deserialize_with = "nullable_id")]
    pub department: Option<Option<u64>>,
    #[serde(default, deserialize_with = "nullable_id")]
    pub team: Option<Option<u64>>,
}

impl ObjectiveUpdateRequest {
    pub fn to_patch(&self) -> ObjectivePatch {
        ObjectivePatch {
            title: self.title.clone(),
            description: self.description.clone(),
            owner: self.owner.map(UserId),
            kind: self.kind,
            status: self.status,
            timeframe: self.timeframe.map(Into::into),
            parent_objective: self.parent_objective.map(|p| p.map(ObjectiveId)),
            department: self.department.map(|d| d.map(DepartmentId)),
            team: self.team.map(|t| t.map(TeamId)),
        }
    }
}

// =============================================================================
// KEY RESULT REQUESTS
// =============================================================================

/// `POST /api/key-results`. The current value always starts at the start
/// value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultRequest {
    #[serde(deserialize_with = "required_id")]
    pub objective: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub metric_type: MetricType,
    #[serde(deserialize_with = "flex")]
    pub start_value: f64,
    #[serde(deserialize_with = "flex")]
    pub target_value: f64,
    #[serde(default)]
    pub confidence_level: Option<ConfidenceLevel>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl KeyResultRequest {
    pub fn to_new_key_result(&self) -> NewKeyResult {
        NewKeyResult {
            objective: ObjectiveId(self.objective),
            title: self.title.clone(),
            description: self.description.clone(),
            metric_type: self.metric_type,
            start_value: self.start_value,
            target_value: self.target_value,
            confidence_level: self.confidence_level,
            unit: self.unit.clone(),
        }
    }
}

/// `PUT /api/key-results/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub metric_type: Option<MetricType>,
    #[serde(default, deserialize_with = "opt_flex")]
    pub start_value: Option<f64>,
    #[serde(default, deserialize_with = "opt_flex")]
    pub target_value: Option<f64>,
    #[serde(default, deserialize_with = "opt_flex")]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub confidence_level: Option<ConfidenceLevel>,
    #[serde(default, deserialize_with = "nullable")]
    pub unit: Option<Option<String>>,
}

impl KeyResultUpdateRequest {
    pub fn to_patch(&self) -> KeyResultPatch {
        KeyResultPatch {
            title: self.title.clone(),
            description: self.description.clone(),
            metric_type: self.metric_type,
            start_value: self.start_value,
            target_value: self.target_value,
            current_value: self.current_value,
            confidence_level: self.confidence_level,
            unit: self.unit.clone(),
        }
    }
}

/// `PATCH /api/key-results/{id}/confidence`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceRequest {
    pub confidence_level: ConfidenceLevel,
    #[serde(default)]
    pub note: Option<String>,
}

// =============================================================================
// ORGANIZATION REQUESTS
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub manager: Option<u64>,
}

impl DepartmentRequest {
    pub fn to_new_department(&self) -> NewDepartment {
        NewDepartment {
            name: self.name.clone(),
            description: self.description.clone(),
            manager: self.manager.map(UserId),
        }
    }
}

/// Blank or missing `managerId` clears the manager.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerRequest {
    #[serde(default, deserialize_with = "opt_id")]
    pub manager_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRequest {
    pub name: String,
    #[serde(deserialize_with = "required_id")]
    pub department: u64,
    #[serde(default, deserialize_with = "opt_id")]
    pub team_lead: Option<u64>,
    #[serde(default, deserialize_with = "id_list")]
    pub members: Vec<u64>,
}

impl TeamRequest {
    pub fn to_new_team(&self) -> NewTeam {
        NewTeam {
            name: self.name.clone(),
            department: DepartmentId(self.department),
            team_lead: self.team_lead.map(UserId),
            members: self.members.iter().copied().map(UserId).collect(),
        }
    }
}

/// Blank or missing `leadId` clears the lead.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRequest {
    #[serde(default, deserialize_with = "opt_id")]
    pub lead_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembersRequest {
    #[serde(deserialize_with = "id_list")]
    pub members: Vec<u64>,
}

impl MembersRequest {
    pub fn user_ids(&self) -> Vec<UserId> {
        self.members.iter().copied().map(UserId).collect()
    }
}

/// `PATCH /api/users/{id}`. `team: null` or `""` removes the user from
/// their team.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "nullable_id")]
    pub department: Option<Option<u64>>,
    #[serde(default, deserialize_with = "nullable_id")]
    pub team: Option<Option<u64>>,
}

impl UserUpdateRequest {
    pub fn to_patch(&self) -> UserPatch {
        UserPatch {
            is_admin: self.is_admin,
            role: self.role,
            department: self.department.map(|d| d.map(DepartmentId)),
            team: self.team.map(|t| t.map(TeamId)),
        }
    }
}

// =============================================================================
// LENIENT DESERIALIZERS
// =============================================================================

/// A number, or a string holding one.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flex<T> {
    Value(T),
    Text(String),
}

/// A document id in any form the web client sends.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
    Expanded {
        #[serde(rename = "_id")]
        id: Flex<u64>,
    },
}

impl RawId {
    fn resolve<E: de::Error>(self) -> Result<Option<u64>, E> {
        match self {
            Self::Number(id) | Self::Expanded { id: Flex::Value(id) } => Ok(Some(id)),
            Self::Text(text) | Self::Expanded { id: Flex::Text(text) } => {
                let text = text.trim();
                if text.is_empty() {
                    Ok(None)
                } else {
                    text.parse()
                        .map(Some)
                        .map_err(|_| E::custom(format!("invalid id '{}'", text)))
                }
            }
        }
    }
}

fn flex<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Flex::<T>::deserialize(deserializer)? {
        Flex::Value(value) => Ok(value),
        Flex::Text(text) => text
            .trim()
            .parse()
            .map_err(|e| de::Error::custom(format!("invalid number '{}': {}", text, e))),
    }
}

fn opt_flex<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<Flex<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flex::Value(value)) => Ok(Some(value)),
        Some(Flex::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Flex::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid number '{}': {}", text, e))),
    }
}

fn opt_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawId>::deserialize(deserializer)? {
        Some(raw) => raw.resolve(),
        None => Ok(None),
    }
}

fn required_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    opt_id(deserializer)?.ok_or_else(|| de::Error::custom("id must not be empty"))
}

/// Present-but-null becomes `Some(None)`; absence stays `None` via
/// `#[serde(default)]`.
fn nullable_id<'de, D>(deserializer: D) -> Result<Option<Option<u64>>, D::Error>
where
    D: Deserializer<'de>,
{
    opt_id(deserializer).map(Some)
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Blank and `null` entries are dropped.
fn id_list<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Option<RawId>>::deserialize(deserializer)?;
    let mut ids = Vec::with_capacity(raw.len());
    for id in raw.into_iter().flatten() {
        if let Some(id) = id.resolve::<D::Error>()? {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_param<T: FromStr>(name: &str, value: Option<&str>) -> Result<Option<T>, OkrError> {
    blank_to_none(value)
        .map(|v| {
            v.parse().map_err(|_| {
                OkrError::Validation(format!("query parameter '{}' is invalid: '{}'", name, v))
            })
        })
        .transpose()
}
