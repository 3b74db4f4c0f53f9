//! # Organization
//!
//! Departments and the teams inside them.

use crate::primitives::{
    MAX_DESCRIPTION_LENGTH, MAX_TEAM_MEMBERS, MAX_TITLE_LENGTH, optional_text, required_text,
};
use crate::{DepartmentId, OkrError, TeamId, UserId};
use serde::{Deserialize, Serialize};

// =============================================================================
// DEPARTMENT
// =============================================================================

/// A department, optionally managed by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
    pub manager: Option<UserId>,
}

/// Input for creating a department.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDepartment {
    pub name: String,
    pub description: Option<String>,
    pub manager: Option<UserId>,
}

impl Department {
    pub fn new(id: DepartmentId, input: &NewDepartment) -> Result<Self, OkrError> {
        Ok(Self {
            id,
            name: required_text("name", &input.name, MAX_TITLE_LENGTH)?,
            description: optional_text(
                "description",
                input.description.as_deref(),
                MAX_DESCRIPTION_LENGTH,
            )?,
            manager: input.manager,
        })
    }
}

// =============================================================================
// TEAM
// =============================================================================

/// A team within a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub department: DepartmentId,
    pub team_lead: Option<UserId>,
    /// Distinct, in order of first insertion.
    pub members: Vec<UserId>,
}

/// Input for creating a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    pub name: String,
    pub department: DepartmentId,
    pub team_lead: Option<UserId>,
    pub members: Vec<UserId>,
}

impl Team {
    pub fn new(id: TeamId, input: &NewTeam) -> Result<Self, OkrError> {
        let mut team = Self {
            id,
            name: required_text("name", &input.name, MAX_TITLE_LENGTH)?,
            department: input.department,
            team_lead: input.team_lead,
            members: Vec::new(),
        };
        team.set_members(&input.members)?;
        Ok(team)
    }

    /// Replace the member list, dropping duplicates.
    pub fn set_members(&mut self, members: &[UserId]) -> Result<(), OkrError> {
        let mut distinct = Vec::with_capacity(members.len());
        for member in members {
            if !distinct.contains(member) {
                distinct.push(*member);
            }
        }
        if distinct.len() > MAX_TEAM_MEMBERS {
            return Err(OkrError::Validation(format!(
                "team has {} members, maximum is {}",
                distinct.len(),
                MAX_TEAM_MEMBERS
            )));
        }
        self.members = distinct;
        Ok(())
    }

    /// Add a member if not already present. Returns whether the list changed.
    pub fn add_member(&mut self, user: UserId) -> bool {
        if self.members.contains(&user) {
            false
        } else {
            self.members.push(user);
            true
        }
    }

    /// Remove a member. Returns whether the list changed.
    pub fn remove_member(&mut self, user: UserId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != user);
        self.members.len() != before
    }

    #[must_use]
    pub fn has_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }
}
