//! # okr-core
//!
//! The OKR tracking engine - THE LOGIC.
//!
//! Objectives are qualitative goals owned by a user and scoped to a person,
//! a team, a department or the organization. Key results are the numbers
//! that measure them. This crate holds the documents, the rules that derive
//! key-result progress and status, the access policy, and the redb store
//! they live in.
//!
//! ## Architectural Constraints
//!
//! - [`Tracker`] is the only way to change stored state
//! - Derived fields (`progress`, `status`) are never written by callers
//! - No async, no network dependencies

// =============================================================================
// MODULES
// =============================================================================

pub mod access;
pub mod key_result;
pub mod objective;
pub mod organization;
pub mod primitives;
pub mod progress;
pub mod seed;
pub mod storage;
pub mod tracker;
pub mod types;
pub mod user;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AuthProvider, ConfidenceLevel, DepartmentId, KeyResultId, KeyResultStatus, MetricType,
    ObjectiveId, ObjectiveStatus, ObjectiveType, OkrError, Role, TeamId, Timeframe, UserId,
};

// =============================================================================
// RE-EXPORTS: Documents
// =============================================================================

pub use key_result::{ConfidenceEntry, KeyResult, KeyResultPatch, NewKeyResult, ProgressEntry};
pub use objective::{NewObjective, Objective, ObjectiveFilter, ObjectivePatch};
pub use organization::{Department, NewDepartment, NewTeam, Team};
pub use user::{GithubProfile, OktaProfile, User, UserPatch};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use progress::{Derivation, Direction};
pub use seed::SeedSummary;
pub use storage::{Batch, Document, Store};
pub use tracker::{ObjectiveView, RecomputeReport, Tracker, TrackerStats};
