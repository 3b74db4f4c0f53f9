//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the OKR tracker:
//! - Document identifiers (`UserId`, `DepartmentId`, `TeamId`, `ObjectiveId`, `KeyResultId`)
//! - Closed enumerations (`Role`, `ObjectiveType`, `ConfidenceLevel`, ...)
//! - The `Timeframe` an objective is planned for
//! - Error types (`OkrError`)
//!
//! All enums serialize as snake_case strings so the JSON surface matches
//! what the web client sends and expects.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// DOCUMENT IDENTIFIERS
// =============================================================================

/// Identifier of a [`crate::User`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Identifier of a [`crate::Department`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DepartmentId(pub u64);

/// Identifier of a [`crate::Team`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u64);

/// Identifier of an [`crate::Objective`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectiveId(pub u64);

/// Identifier of a [`crate::KeyResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyResultId(pub u64);

macro_rules! display_raw_id {
    ($($id:ty),+) => {
        $(
            impl fmt::Display for $id {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

display_raw_id!(UserId, DepartmentId, TeamId, ObjectiveId, KeyResultId);

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Organizational role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Individual,
    TeamLead,
    Manager,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::TeamLead => "team_lead",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }
}

/// Identity provider a user signed in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    Github,
    Okta,
}

/// Scope an objective belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveType {
    Individual,
    Team,
    Department,
    Organization,
}

impl ObjectiveType {
    /// Whether objectives of this type must reference a department.
    #[must_use]
    pub const fn requires_department(self) -> bool {
        matches!(self, Self::Individual | Self::Team | Self::Department)
    }

    /// Whether objectives of this type must reference a team.
    #[must_use]
    pub const fn requires_team(self) -> bool {
        matches!(self, Self::Team)
    }
}

/// Lifecycle state of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    #[default]
    Draft,
    Active,
    Completed,
    Cancelled,
}

/// Unit family of a key result's numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Number,
    Percentage,
    Currency,
    Boolean,
}

/// Self-reported likelihood of hitting a key result's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ConfidenceLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Derived health of a key result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyResultStatus {
    #[default]
    OnTrack,
    AtRisk,
    Behind,
    Completed,
}

impl KeyResultStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnTrack => "on_track",
            Self::AtRisk => "at_risk",
            Self::Behind => "behind",
            Self::Completed => "completed",
        }
    }
}

// =============================================================================
// TIMEFRAME
// =============================================================================

/// Planning period of an objective: a calendar quarter of a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timeframe {
    /// Quarter, 1 through 4.
    pub quarter: u8,
    pub year: i32,
}

impl Timeframe {
    /// Create a timeframe, rejecting quarters outside 1..=4.
    pub fn new(quarter: u8, year: i32) -> Result<Self, OkrError> {
        let timeframe = Self { quarter, year };
        timeframe.validate()?;
        Ok(timeframe)
    }

    pub fn validate(&self) -> Result<(), OkrError> {
        if (1..=4).contains(&self.quarter) {
            Ok(())
        } else {
            Err(OkrError::Validation(format!(
                "timeframe.quarter must be between 1 and 4, got {}",
                self.quarter
            )))
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the OKR tracker.
///
/// The display text of the request-facing variants is what API clients see
/// in the `error` field, so it is phrased for people, not for logs.
#[derive(Debug, Error)]
pub enum OkrError {
    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// A referenced document does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The caller could not be identified.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller is identified but not allowed to do this.
    #[error("{0}")]
    Forbidden(String),

    /// The write would violate a uniqueness rule.
    #[error("{0}")]
    Conflict(String),

    /// The underlying database failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OkrError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{} not found", what))
    }
}

// =============================================================================
// TESTS
// =============================================================================
