//! # Access Policy
//!
//! Who may change what. Pure functions over the acting user and the target
//! document; the `ensure_*` variants turn a denial into
//! [`OkrError::Forbidden`] and log it.

use crate::{Objective, OkrError, Role, User};

/// Owner, administrator, the manager of the objective's department, or the
/// lead of the objective's team.
#[must_use]
pub fn can_edit_objective(user: &User, objective: &Objective) -> bool {
    if objective.owner == user.id || user.is_admin() {
        return true;
    }
    match user.role {
        Role::Manager => user.department.is_some() && user.department == objective.department,
        Role::TeamLead => user.team.is_some() && user.team == objective.team,
        Role::Individual | Role::Admin => false,
    }
}

/// Owner or administrator.
#[must_use]
pub fn can_delete_objective(user: &User, objective: &Objective) -> bool {
    objective.owner == user.id || user.is_admin()
}

/// Owner of the parent objective or administrator.
#[must_use]
pub fn can_edit_key_result(user: &User, parent: &Objective) -> bool {
    parent.owner == user.id || user.is_admin()
}

fn deny(user: &User, action: &'static str, message: &str) -> OkrError {
    tracing::warn!(
        event = "permission_denied",
        user = %user.id,
        role = user.role.as_str(),
        action,
    );
    OkrError::Forbidden(message.to_string())
}

pub fn ensure_can_edit_objective(user: &User, objective: &Objective) -> Result<(), OkrError> {
    if can_edit_objective(user, objective) {
        Ok(())
    } else {
        Err(deny(user, "edit_objective", "Not authorized to edit this objective"))
    }
}

pub fn ensure_can_delete_objective(user: &User, objective: &Objective) -> Result<(), OkrError> {
    if can_delete_objective(user, objective) {
        Ok(())
    } else {
        Err(deny(user, "delete_objective", "Not authorized to delete this objective"))
    }
}

pub fn ensure_can_edit_key_result(user: &User, parent: &Objective) -> Result<(), OkrError> {
    if can_edit_key_result(user, parent) {
        Ok(())
    } else {
        Err(deny(user, "edit_key_result", "Not authorized to edit this key result"))
    }
}

pub fn ensure_admin(user: &User) -> Result<(), OkrError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(deny(user, "admin", "Admin access required"))
    }
}
