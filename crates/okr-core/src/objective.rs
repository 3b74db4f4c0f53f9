//! # Objectives
//!
//! An objective is a qualitative goal owned by one user, scoped to an
//! individual, a team, a department or the whole organization, and planned
//! for one quarter. Its progress is the rollup of its key results.

use crate::primitives::{MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, optional_text, required_text};
use crate::{
    DepartmentId, ObjectiveId, ObjectiveStatus, ObjectiveType, OkrError, TeamId, Timeframe,
    UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A qualitative goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: ObjectiveId,
    pub title: String,
    pub description: Option<String>,
    pub owner: UserId,
    pub kind: ObjectiveType,
    pub status: ObjectiveStatus,
    pub timeframe: Timeframe,
    /// Rollup of key-result progress, kept in sync on every key-result write.
    pub progress: u8,
    pub parent_objective: Option<ObjectiveId>,
    pub department: Option<DepartmentId>,
    pub team: Option<TeamId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an objective.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObjective {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to the creating user.
    pub owner: Option<UserId>,
    pub kind: ObjectiveType,
    pub status: Option<ObjectiveStatus>,
    pub timeframe: Timeframe,
    pub parent_objective: Option<ObjectiveId>,
    pub department: Option<DepartmentId>,
    pub team: Option<TeamId>,
}

/// Partial update of an objective. The outer `Option` is "leave alone",
/// an inner `None` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectivePatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub owner: Option<UserId>,
    pub kind: Option<ObjectiveType>,
    pub status: Option<ObjectiveStatus>,
    pub timeframe: Option<Timeframe>,
    pub parent_objective: Option<Option<ObjectiveId>>,
    pub department: Option<Option<DepartmentId>>,
    pub team: Option<Option<TeamId>>,
}

impl Objective {
    /// Build and validate a new objective owned by `owner`.
    pub fn new(
        id: ObjectiveId,
        input: &NewObjective,
        owner: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, OkrError> {
        let objective = Self {
            id,
            title: required_text("title", &input.title, MAX_TITLE_LENGTH)?,
            description: optional_text(
                "description",
                input.description.as_deref(),
                MAX_DESCRIPTION_LENGTH,
            )?,
            owner,
            kind: input.kind,
            status: input.status.unwrap_or_default(),
            timeframe: input.timeframe,
            progress: 0,
            parent_objective: input.parent_objective,
            department: input.department,
            team: input.team,
            created_at: now,
            updated_at: now,
        };
        objective.validate()?;
        Ok(objective)
    }

    /// Apply a patch and re-validate. On error `self` is left unchanged.
    pub fn apply_patch(&mut self, patch: &ObjectivePatch, now: DateTime<Utc>) -> Result<(), OkrError> {
        let mut next = self.clone();
        if let Some(title) = &patch.title {
            next.title = required_text("title", title, MAX_TITLE_LENGTH)?;
        }
        if let Some(description) = &patch.description {
            next.description =
                optional_text("description", description.as_deref(), MAX_DESCRIPTION_LENGTH)?;
        }
        if let Some(owner) = patch.owner {
            next.owner = owner;
        }
        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(timeframe) = patch.timeframe {
            next.timeframe = timeframe;
        }
        if let Some(parent) = patch.parent_objective {
            next.parent_objective = parent;
        }
        if let Some(department) = patch.department {
            next.department = department;
        }
        if let Some(team) = patch.team {
            next.team = team;
        }
        next.updated_at = now;
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Shape rules that do not need the store.
    pub fn validate(&self) -> Result<(), OkrError> {
        self.timeframe.validate()?;
        if self.kind.requires_department() && self.department.is_none() {
            return Err(OkrError::Validation(format!(
                "department is required for {} objectives",
                kind_name(self.kind)
            )));
        }
        if self.kind.requires_team() && self.team.is_none() {
            return Err(OkrError::Validation(
                "team is required for team objectives".to_string(),
            ));
        }
        if self.parent_objective == Some(self.id) {
            return Err(OkrError::Validation(
                "an objective cannot be its own parent".to_string(),
            ));
        }
        Ok(())
    }
}

fn kind_name(kind: ObjectiveType) -> &'static str {
    match kind {
        ObjectiveType::Individual => "individual",
        ObjectiveType::Team => "team",
        ObjectiveType::Department => "department",
        ObjectiveType::Organization => "organization",
    }
}

// =============================================================================
// LIST FILTER
// =============================================================================

/// Query filter for listing objectives.
///
/// - `quarter` and `year` only apply together.
/// - `team` matches team objectives of that team and individual objectives
///   owned by the team's members.
/// - The type constraint is decided by the most specific parameter:
///   `owner` forces `individual`, then `team` keeps `kind`, then
///   `department` forces `department`, then `kind` alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectiveFilter {
    pub quarter: Option<u8>,
    pub year: Option<i32>,
    pub kind: Option<ObjectiveType>,
    pub department: Option<DepartmentId>,
    pub team: Option<TeamId>,
    pub owner: Option<UserId>,
}

impl ObjectiveFilter {
    /// The type an objective must have to match, if any.
    #[must_use]
    pub fn effective_kind(&self) -> Option<ObjectiveType> {
        if self.owner.is_some() {
            Some(ObjectiveType::Individual)
        } else if self.team.is_some() {
            self.kind
        } else if self.department.is_some() {
            Some(ObjectiveType::Department)
        } else {
            self.kind
        }
    }

    /// Test one objective. `team_members` are the users whose team is
    /// `self.team`; it is ignored when no team filter is set.
    #[must_use]
    pub fn matches(&self, objective: &Objective, team_members: &BTreeSet<UserId>) -> bool {
        if let (Some(quarter), Some(year)) = (self.quarter, self.year) {
            if objective.timeframe.quarter != quarter || objective.timeframe.year != year {
                return false;
            }
        }

        if self.effective_kind().is_some_and(|kind| objective.kind != kind) {
            return false;
        }

        if self.department.is_some() && objective.department != self.department {
            return false;
        }

        if let Some(team) = self.team {
            let team_objective =
                objective.kind == ObjectiveType::Team && objective.team == Some(team);
            let member_objective = objective.kind == ObjectiveType::Individual
                && team_members.contains(&objective.owner);
            if !team_objective && !member_objective {
                return false;
            }
        }

        self.owner.is_none_or(|owner| objective.owner == owner)
    }
}
