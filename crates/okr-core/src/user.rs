//! # Users
//!
//! A user is an authenticated identity plus its place in the organization.
//! Users are never created directly: they appear the first time someone
//! signs in through GitHub or Okta, and are linked by email when the same
//! person later uses the other provider.

use crate::primitives::{MAX_TITLE_LENGTH, normalize_email, required_text};
use crate::{AuthProvider, DepartmentId, OkrError, Role, TeamId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A person who can own objectives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Unique, lowercased.
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
    pub department: Option<DepartmentId>,
    pub team: Option<TeamId>,
    pub auth_provider: AuthProvider,
    pub github_id: Option<String>,
    /// Kept for later GitHub API calls; never leaves the server.
    pub github_access_token: Option<String>,
    pub okta_id: Option<String>,
    pub last_login: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Administrators may manage the organization and override ownership.
    ///
    /// Either the explicit flag or the `admin` role grants it.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin || self.role == Role::Admin
    }

    /// Create a user record for a first-time GitHub sign-in.
    pub fn from_github(
        id: UserId,
        profile: &GithubProfile,
        now: DateTime<Utc>,
    ) -> Result<Self, OkrError> {
        let mut user = Self::blank(
            id,
            &profile.display_name(),
            &profile.resolved_email(),
            AuthProvider::Github,
            now,
        )?;
        user.github_id = Some(profile.github_id.clone());
        user.github_access_token = Some(profile.access_token.clone());
        Ok(user)
    }

    /// Create a user record for a first-time Okta sign-in.
    pub fn from_okta(id: UserId, profile: &OktaProfile, now: DateTime<Utc>) -> Result<Self, OkrError> {
        let mut user = Self::blank(id, &profile.name, &profile.email, AuthProvider::Okta, now)?;
        user.okta_id = Some(profile.okta_id.clone());
        Ok(user)
    }

    fn blank(
        id: UserId,
        name: &str,
        email: &str,
        auth_provider: AuthProvider,
        now: DateTime<Utc>,
    ) -> Result<Self, OkrError> {
        Ok(Self {
            id,
            name: required_text("name", name, MAX_TITLE_LENGTH)?,
            email: normalize_email(email)?,
            role: Role::Individual,
            is_admin: false,
            department: None,
            team: None,
            auth_provider,
            github_id: None,
            github_access_token: None,
            okta_id: None,
            last_login: now,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Attach GitHub credentials to an existing user and mark a login.
    pub fn link_github(&mut self, profile: &GithubProfile, now: DateTime<Utc>) {
        self.github_id = Some(profile.github_id.clone());
        self.github_access_token = Some(profile.access_token.clone());
        self.auth_provider = AuthProvider::Github;
        self.touch_login(now);
    }

    /// Attach an Okta subject to an existing user and mark a login.
    pub fn link_okta(&mut self, profile: &OktaProfile, now: DateTime<Utc>) {
        self.okta_id = Some(profile.okta_id.clone());
        self.auth_provider = AuthProvider::Okta;
        self.touch_login(now);
    }

    pub fn touch_login(&mut self, now: DateTime<Utc>) {
        self.last_login = now;
        self.updated_at = now;
    }

    /// Apply an administrative patch. Team membership bookkeeping is the
    /// caller's job; this only edits the user document.
    pub fn apply_patch(&mut self, patch: &UserPatch, now: DateTime<Utc>) {
        if let Some(is_admin) = patch.is_admin {
            self.is_admin = is_admin;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(department) = patch.department {
            self.department = department;
        }
        if let Some(team) = patch.team {
            self.team = team;
        }
        self.updated_at = now;
    }
}

// =============================================================================
// SIGN-IN PROFILES
// =============================================================================

/// What the GitHub OAuth flow tells us about a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubProfile {
    /// Numeric GitHub account id, as a string.
    pub github_id: String,
    pub login: String,
    pub name: Option<String>,
    /// Best email GitHub would give us, if any.
    pub email: Option<String>,
    pub access_token: String,
}

impl GithubProfile {
    /// Display name, falling back to the login.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.login)
            .to_string()
    }

    /// Email, falling back to `<login>@github.com`.
    #[must_use]
    pub fn resolved_email(&self) -> String {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}@github.com", self.login))
    }
}

/// What the web client reports after completing an Okta sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OktaProfile {
    /// Okta subject (`sub` claim).
    pub okta_id: String,
    pub email: String,
    pub name: String,
}

// =============================================================================
// PATCH
// =============================================================================

/// Administrative changes to a user. The outer `Option` is "leave alone",
/// the inner one is "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub is_admin: Option<bool>,
    pub role: Option<Role>,
    pub department: Option<Option<DepartmentId>>,
    pub team: Option<Option<TeamId>>,
}
