//! # Tracker
//!
//! The single entry point for every business operation. A `Tracker` owns
//! the document store; callers pass the acting [`User`] wherever the access
//! policy applies.
//!
//! Writes that touch several documents (team membership sync, cascade
//! deletes, objective rollups) are staged in one [`Batch`] and committed
//! together.

use crate::access;
use crate::primitives::normalize_email;
use crate::progress;
use crate::storage::{Batch, Document, Store};
use crate::{
    ConfidenceLevel, Department, DepartmentId, GithubProfile, KeyResult, KeyResultId,
    KeyResultPatch, NewDepartment, NewKeyResult, NewObjective, NewTeam, Objective, ObjectiveFilter,
    ObjectiveId, ObjectivePatch, OkrError, OktaProfile, Team, TeamId, User, UserId, UserPatch,
};
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// An objective together with its key results and their live rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveView {
    pub objective: Objective,
    pub key_results: Vec<KeyResult>,
    /// Rounded mean of `key_results[*].progress`.
    pub rollup: u8,
}

impl ObjectiveView {
    fn new(objective: Objective, key_results: Vec<KeyResult>) -> Self {
        let rollup = progress::rollup(key_results.iter().map(|kr| kr.progress));
        Self {
            objective,
            key_results,
            rollup,
        }
    }
}

/// Document counts per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    pub users: usize,
    pub departments: usize,
    pub teams: usize,
    pub objectives: usize,
    pub key_results: usize,
}

/// Outcome of [`Tracker::recompute_key_results`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecomputeReport {
    /// Key results examined.
    pub key_results: usize,
    /// Key results whose progress or status changed.
    pub key_results_changed: usize,
    /// Objectives whose stored progress changed.
    pub objectives_changed: usize,
}

/// Business operations over a [`Store`].
#[derive(Debug)]
pub struct Tracker {
    store: Store,
}

impl Tracker {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Tracker over a fresh in-memory store.
    pub fn in_memory() -> Result<Self, OkrError> {
        Ok(Self::new(Store::in_memory()?))
    }

    /// Tracker over a database file, created if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OkrError> {
        Ok(Self::new(Store::open(path)?))
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.store.is_persistent()
    }

    pub(crate) fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    fn require<D: Document>(&self, key: u64, what: &str) -> Result<D, OkrError> {
        self.store
            .get::<D>(key)?
            .ok_or_else(|| OkrError::not_found(what))
    }

    // =========================================================================
    // SIGN-IN
    // =========================================================================

    /// Resolve a GitHub sign-in to a user: by GitHub id, then by email
    /// (linking the account), else a new `individual` user.
    pub fn find_or_create_github_user(&mut self, profile: &GithubProfile) -> Result<User, OkrError> {
        let now = Utc::now();
        let email = normalize_email(&profile.resolved_email())?;
        let mut users = self.store.list::<User>()?;

        let existing = users
            .iter()
            .position(|u| u.github_id.as_deref() == Some(profile.github_id.as_str()))
            .or_else(|| users.iter().position(|u| u.email == email));

        let user = match existing {
            Some(index) => {
                let mut user = users.swap_remove(index);
                if user
                    .github_id
                    .as_deref()
                    .is_some_and(|id| id != profile.github_id)
                {
                    return Err(OkrError::Conflict(
                        "Email is already linked to another GitHub account".to_string(),
                    ));
                }
                user.link_github(profile, now);
                user
            }
            None => User::from_github(UserId(self.store.allocate_id()), profile, now)?,
        };

        ensure_active(&user)?;
        self.store.put(&user)?;
        tracing::info!(user = %user.id, provider = "github", "user signed in");
        Ok(user)
    }

    /// Resolve an Okta sign-in to a user: by Okta subject, then by email
    /// (linking the account), else a new `individual` user.
    pub fn find_or_create_okta_user(&mut self, profile: &OktaProfile) -> Result<User, OkrError> {
        let now = Utc::now();
        let email = normalize_email(&profile.email)?;
        let mut users = self.store.list::<User>()?;

        let existing = users
            .iter()
            .position(|u| u.okta_id.as_deref() == Some(profile.okta_id.as_str()))
            .or_else(|| users.iter().position(|u| u.email == email));

        let user = match existing {
            Some(index) => {
                let mut user = users.swap_remove(index);
                if user
                    .okta_id
                    .as_deref()
                    .is_some_and(|id| id != profile.okta_id)
                {
                    return Err(OkrError::Conflict(
                        "Email is already linked to another Okta account".to_string(),
                    ));
                }
                user.link_okta(profile, now);
                user
            }
            None => User::from_okta(UserId(self.store.allocate_id()), profile, now)?,
        };

        ensure_active(&user)?;
        self.store.put(&user)?;
        tracing::info!(user = %user.id, provider = "okta", "user signed in");
        Ok(user)
    }

    // =========================================================================
    // USERS
    // =========================================================================

    pub fn user(&self, id: UserId) -> Result<User, OkrError> {
        self.require(id.0, "User")
    }

    /// Lookup that treats a missing user as `None`.
    pub fn find_user(&self, id: UserId) -> Result<Option<User>, OkrError> {
        self.store.get(id.0)
    }

    pub fn users(&self) -> Result<Vec<User>, OkrError> {
        self.store.list()
    }

    /// Administrative user update. A team change moves the user out of
    /// every team's member list and into the new one.
    pub fn update_user(
        &mut self,
        actor: &User,
        id: UserId,
        patch: &UserPatch,
    ) -> Result<User, OkrError> {
        access::ensure_admin(actor)?;
        let mut user = self.user(id)?;

        if let Some(Some(department)) = patch.department {
            self.department(department)?;
        }

        let mut batch = Batch::new();
        if let Some(new_team) = patch.team {
            if let Some(team) = new_team {
                self.team(team)?;
            }
            for mut team in self.store.list::<Team>()? {
                let changed = if Some(team.id) == new_team {
                    team.add_member(id)
                } else {
                    team.remove_member(id)
                };
                if changed {
                    batch.put(&team)?;
                }
            }
        }

        user.apply_patch(patch, Utc::now());
        batch.put(&user)?;
        self.store.commit(batch)?;
        tracing::info!(actor = %actor.id, user = %id, "user updated");
        Ok(user)
    }

    /// Delete a user and every membership, lead and manager reference to
    /// them. Objectives they own are kept.
    pub fn delete_user(&mut self, actor: &User, id: UserId) -> Result<(), OkrError> {
        access::ensure_admin(actor)?;
        self.user(id)?;

        let mut batch = Batch::new();
        for mut team in self.store.list::<Team>()? {
            let mut changed = team.remove_member(id);
            if team.team_lead == Some(id) {
                team.team_lead = None;
                changed = true;
            }
            if changed {
                batch.put(&team)?;
            }
        }
        for mut department in self.store.list::<Department>()? {
            if department.manager == Some(id) {
                department.manager = None;
                batch.put(&department)?;
            }
        }
        batch.remove::<User>(id.0);
        self.store.commit(batch)?;
        tracing::info!(actor = %actor.id, user = %id, "user deleted");
        Ok(())
    }

    // =========================================================================
    // DEPARTMENTS AND TEAMS
    // =========================================================================

    pub fn department(&self, id: DepartmentId) -> Result<Department, OkrError> {
        self.require(id.0, "Department")
    }

    pub fn departments(&self) -> Result<Vec<Department>, OkrError> {
        self.store.list()
    }

    pub fn create_department(
        &mut self,
        actor: &User,
        input: &NewDepartment,
    ) -> Result<Department, OkrError> {
        access::ensure_admin(actor)?;
        if let Some(manager) = input.manager {
            self.user(manager)?;
        }
        let department = Department::new(DepartmentId(self.store.allocate_id()), input)?;
        self.store.put(&department)?;
        Ok(department)
    }

    /// Set or clear (`None`) a department's manager.
    pub fn set_department_manager(
        &mut self,
        actor: &User,
        id: DepartmentId,
        manager: Option<UserId>,
    ) -> Result<Department, OkrError> {
        access::ensure_admin(actor)?;
        let mut department = self.department(id)?;
        if let Some(manager) = manager {
            self.user(manager)?;
        }
        department.manager = manager;
        self.store.put(&department)?;
        Ok(department)
    }

    pub fn team(&self, id: TeamId) -> Result<Team, OkrError> {
        self.require(id.0, "Team")
    }

    pub fn teams(&self) -> Result<Vec<Team>, OkrError> {
        self.store.list()
    }

    pub fn create_team(&mut self, actor: &User, input: &NewTeam) -> Result<Team, OkrError> {
        access::ensure_admin(actor)?;
        self.department(input.department)?;
        if let Some(lead) = input.team_lead {
            self.user(lead)?;
        }
        for member in &input.members {
            self.user(*member)?;
        }
        let team = Team::new(TeamId(self.store.allocate_id()), input)?;
        self.store.put(&team)?;
        Ok(team)
    }

    /// Set or clear (`None`) a team's lead.
    pub fn set_team_lead(
        &mut self,
        actor: &User,
        id: TeamId,
        lead: Option<UserId>,
    ) -> Result<Team, OkrError> {
        access::ensure_admin(actor)?;
        let mut team = self.team(id)?;
        if let Some(lead) = lead {
            self.user(lead)?;
        }
        team.team_lead = lead;
        self.store.put(&team)?;
        Ok(team)
    }

    /// Replace a team's member list.
    pub fn set_team_members(
        &mut self,
        actor: &User,
        id: TeamId,
        members: &[UserId],
    ) -> Result<Team, OkrError> {
        access::ensure_admin(actor)?;
        let mut team = self.team(id)?;
        for member in members {
            self.user(*member)?;
        }
        team.set_members(members)?;
        self.store.put(&team)?;
        Ok(team)
    }

    // =========================================================================
    // OBJECTIVES
    // =========================================================================

    /// Objectives matching `filter`, each with its key results, in id order.
    pub fn objectives(&self, filter: &ObjectiveFilter) -> Result<Vec<ObjectiveView>, OkrError> {
        let team_members: BTreeSet<UserId> = match filter.team {
            Some(team) => self
                .store
                .list::<User>()?
                .into_iter()
                .filter(|u| u.team == Some(team))
                .map(|u| u.id)
                .collect(),
            None => BTreeSet::new(),
        };

        let mut by_objective: BTreeMap<ObjectiveId, Vec<KeyResult>> = BTreeMap::new();
        for key_result in self.store.list::<KeyResult>()? {
            by_objective
                .entry(key_result.objective)
                .or_default()
                .push(key_result);
        }

        let views = self
            .store
            .list::<Objective>()?
            .into_iter()
            .filter(|o| filter.matches(o, &team_members))
            .map(|objective| {
                let key_results = by_objective.remove(&objective.id).unwrap_or_default();
                ObjectiveView::new(objective, key_results)
            })
            .collect();
        Ok(views)
    }

    /// One objective with its key results.
    pub fn objective(&self, id: ObjectiveId) -> Result<ObjectiveView, OkrError> {
        let objective = self.require::<Objective>(id.0, "Objective")?;
        let key_results = self.key_results_for(id)?;
        Ok(ObjectiveView::new(objective, key_results))
    }

    /// Create an objective. The owner defaults to the actor.
    pub fn create_objective(
        &mut self,
        actor: &User,
        input: &NewObjective,
    ) -> Result<Objective, OkrError> {
        let owner = input.owner.unwrap_or(actor.id);
        let objective = Objective::new(
            ObjectiveId(self.store.allocate_id()),
            input,
            owner,
            Utc::now(),
        )?;
        self.user(objective.owner)?;
        self.check_references(&objective)?;
        self.store.put(&objective)?;
        tracing::info!(actor = %actor.id, objective = %objective.id, "objective created");
        Ok(objective)
    }

    pub fn update_objective(
        &mut self,
        actor: &User,
        id: ObjectiveId,
        patch: &ObjectivePatch,
    ) -> Result<Objective, OkrError> {
        let mut objective = self.require::<Objective>(id.0, "Objective")?;
        access::ensure_can_edit_objective(actor, &objective)?;
        objective.apply_patch(patch, Utc::now())?;
        if let Some(owner) = patch.owner {
            self.user(owner)?;
        }
        self.check_references(&objective)?;
        self.store.put(&objective)?;
        Ok(objective)
    }

    /// Delete an objective and its key results in one transaction. Child
    /// objectives lose their parent reference. Returns the number of key
    /// results removed.
    pub fn delete_objective(&mut self, actor: &User, id: ObjectiveId) -> Result<usize, OkrError> {
        let objective = self.require::<Objective>(id.0, "Objective")?;
        access::ensure_can_delete_objective(actor, &objective)?;

        let mut batch = Batch::new();
        let key_results = self.key_results_for(id)?;
        for key_result in &key_results {
            batch.remove::<KeyResult>(key_result.id.0);
        }
        for mut child in self.store.list::<Objective>()? {
            if child.parent_objective == Some(id) {
                child.parent_objective = None;
                batch.put(&child)?;
            }
        }
        batch.remove::<Objective>(id.0);
        self.store.commit(batch)?;

        tracing::info!(
            actor = %actor.id,
            objective = %id,
            key_results = key_results.len(),
            "objective deleted"
        );
        Ok(key_results.len())
    }

    /// The owner is checked by the callers: objectives outlive their owner's
    /// account.
    fn check_references(&self, objective: &Objective) -> Result<(), OkrError> {
        if let Some(department) = objective.department {
            self.department(department)?;
        }
        if let Some(team) = objective.team {
            self.team(team)?;
        }
        if let Some(parent) = objective.parent_objective {
            self.require::<Objective>(parent.0, "Parent objective")?;
        }
        Ok(())
    }

    // =========================================================================
    // KEY RESULTS
    // =========================================================================

    /// Key results of one objective, in id order.
    pub fn key_results_for(&self, objective: ObjectiveId) -> Result<Vec<KeyResult>, OkrError> {
        Ok(self
            .store
            .list::<KeyResult>()?
            .into_iter()
            .filter(|kr| kr.objective == objective)
            .collect())
    }

    pub fn create_key_result(
        &mut self,
        actor: &User,
        input: &NewKeyResult,
    ) -> Result<KeyResult, OkrError> {
        let objective = self.require::<Objective>(input.objective.0, "Objective")?;
        access::ensure_can_edit_key_result(actor, &objective)?;

        let key_result = KeyResult::new(KeyResultId(self.store.allocate_id()), input, Utc::now())?;
        let mut batch = Batch::new();
        batch.put(&key_result)?;
        self.stage_rollup(objective, Some(&key_result), None, &mut batch)?;
        self.store.commit(batch)?;
        Ok(key_result)
    }

    pub fn update_key_result(
        &mut self,
        actor: &User,
        id: KeyResultId,
        patch: &KeyResultPatch,
    ) -> Result<KeyResult, OkrError> {
        let (mut key_result, objective) = self.key_result_with_parent(id)?;
        access::ensure_can_edit_key_result(actor, &objective)?;

        key_result.apply_patch(patch, Utc::now())?;
        let mut batch = Batch::new();
        batch.put(&key_result)?;
        self.stage_rollup(objective, Some(&key_result), None, &mut batch)?;
        self.store.commit(batch)?;
        Ok(key_result)
    }

    pub fn delete_key_result(&mut self, actor: &User, id: KeyResultId) -> Result<(), OkrError> {
        let (key_result, objective) = self.key_result_with_parent(id)?;
        access::ensure_can_edit_key_result(actor, &objective)?;

        let mut batch = Batch::new();
        batch.remove::<KeyResult>(key_result.id.0);
        self.stage_rollup(objective, None, Some(key_result.id), &mut batch)?;
        self.store.commit(batch)?;
        Ok(())
    }

    /// Set the confidence level, recording one history entry with `note`.
    pub fn update_confidence(
        &mut self,
        actor: &User,
        id: KeyResultId,
        level: ConfidenceLevel,
        note: Option<&str>,
    ) -> Result<KeyResult, OkrError> {
        let (mut key_result, objective) = self.key_result_with_parent(id)?;
        access::ensure_can_edit_key_result(actor, &objective)?;

        key_result.update_confidence(level, note, Utc::now())?;
        let mut batch = Batch::new();
        batch.put(&key_result)?;
        self.stage_rollup(objective, Some(&key_result), None, &mut batch)?;
        self.store.commit(batch)?;
        Ok(key_result)
    }

    fn key_result_with_parent(&self, id: KeyResultId) -> Result<(KeyResult, Objective), OkrError> {
        let key_result = self.require::<KeyResult>(id.0, "Key result")?;
        let objective = self.require::<Objective>(key_result.objective.0, "Parent objective")?;
        Ok((key_result, objective))
    }

    /// Queue an objective write if its rollup moves once `changed` is
    /// saved and `removed` is gone.
    fn stage_rollup(
        &self,
        mut objective: Objective,
        changed: Option<&KeyResult>,
        removed: Option<KeyResultId>,
        batch: &mut Batch,
    ) -> Result<(), OkrError> {
        let mut values: BTreeMap<KeyResultId, u8> = self
            .key_results_for(objective.id)?
            .into_iter()
            .map(|kr| (kr.id, kr.progress))
            .collect();
        if let Some(key_result) = changed {
            values.insert(key_result.id, key_result.progress);
        }
        if let Some(id) = removed {
            values.remove(&id);
        }

        let rollup = progress::rollup(values.into_values());
        if rollup != objective.progress {
            objective.progress = rollup;
            batch.put(&objective)?;
        }
        Ok(())
    }

    // =========================================================================
    // MAINTENANCE
    // =========================================================================

    /// Re-derive every key result and refresh every objective rollup.
    pub fn recompute_key_results(&mut self) -> Result<RecomputeReport, OkrError> {
        let mut batch = Batch::new();
        let mut by_objective: BTreeMap<ObjectiveId, Vec<u8>> = BTreeMap::new();
        let mut examined = 0;
        let mut key_results_changed = 0;

        for mut key_result in self.store.list::<KeyResult>()? {
            examined += 1;
            let before = (key_result.progress, key_result.status);
            key_result.recompute();
            if before != (key_result.progress, key_result.status) {
                key_results_changed += 1;
                batch.put(&key_result)?;
            }
            by_objective
                .entry(key_result.objective)
                .or_default()
                .push(key_result.progress);
        }

        let mut objectives_changed = 0;
        for mut objective in self.store.list::<Objective>()? {
            let rollup = progress::rollup(by_objective.remove(&objective.id).unwrap_or_default());
            if rollup != objective.progress {
                objective.progress = rollup;
                objectives_changed += 1;
                batch.put(&objective)?;
            }
        }

        self.store.commit(batch)?;
        let report = RecomputeReport {
            key_results: examined,
            key_results_changed,
            objectives_changed,
        };
        tracing::info!(
            key_results = report.key_results,
            key_results_changed = report.key_results_changed,
            objectives_changed = report.objectives_changed,
            "key results recomputed"
        );
        Ok(report)
    }

    pub fn stats(&self) -> Result<TrackerStats, OkrError> {
        Ok(TrackerStats {
            users: self.store.count::<User>()?,
            departments: self.store.count::<Department>()?,
            teams: self.store.count::<Team>()?,
            objectives: self.store.count::<Objective>()?,
            key_results: self.store.count::<KeyResult>()?,
        })
    }
}

fn ensure_active(user: &User) -> Result<(), OkrError> {
    if user.is_active {
        Ok(())
    } else {
        Err(OkrError::Unauthorized("User account is inactive".to_string()))
    }
}
