//! # Progress Derivation
//!
//! The rules that turn a key result's three numbers and its confidence level
//! into a progress percentage and a status label.
//!
//! ## Progress
//!
//! Linear interpolation between start and target, rounded and clamped to
//! `0..=100`. The direction follows the numbers: when the target is below
//! the start, lower values are better and the interpolation is mirrored.
//! A flat metric (`start == target`) is either done (100) or not (0).
//!
//! ## Status
//!
//! | Rule | Condition                                   | Status      |
//! |------|---------------------------------------------|-------------|
//! | 1    | target met                                  | `completed` |
//! | 2    | progress >= 75 and confidence `high`        | `on_track`  |
//! | 3    | progress < 25 or confidence `low`           | `at_risk`   |
//! | 4    | progress < 50 and confidence not `high`     | `behind`    |
//! | 5    | otherwise                                   | `on_track`  |
//!
//! Rules are evaluated top to bottom; the first match wins.

use crate::primitives::{
    AT_RISK_THRESHOLD, BEHIND_THRESHOLD, COMPLETE_PROGRESS, ON_TRACK_THRESHOLD,
};
use crate::{ConfidenceLevel, KeyResultStatus};

/// Which way a metric has to move to reach its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Higher is better (`target >= start`).
    Increasing,
    /// Lower is better (`target < start`).
    Decreasing,
}

impl Direction {
    #[must_use]
    pub fn of(start: f64, target: f64) -> Self {
        if target < start {
            Self::Decreasing
        } else {
            Self::Increasing
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
        }
    }
}

/// Whether `current` has reached `target`, honouring the metric direction.
#[must_use]
pub fn target_met(start: f64, current: f64, target: f64) -> bool {
    match Direction::of(start, target) {
        Direction::Increasing => current >= target,
        Direction::Decreasing => current <= target,
    }
}

/// Progress percentage in `0..=100`.
#[must_use]
pub fn compute_progress(start: f64, current: f64, target: f64) -> u8 {
    let (covered, range) = match Direction::of(start, target) {
        Direction::Increasing => (current - start, target - start),
        Direction::Decreasing => (start - current, start - target),
    };

    if range == 0.0 {
        return if target_met(start, current, target) {
            COMPLETE_PROGRESS
        } else {
            0
        };
    }

    let percent = (covered / range * 100.0).round();
    if percent.is_nan() {
        return 0;
    }
    percent.clamp(0.0, f64::from(COMPLETE_PROGRESS)) as u8
}

/// Status label from the decision table in the module docs.
#[must_use]
pub fn derive_status(
    progress: u8,
    confidence: ConfidenceLevel,
    target_met: bool,
) -> KeyResultStatus {
    if target_met {
        KeyResultStatus::Completed
    } else if progress >= ON_TRACK_THRESHOLD && confidence == ConfidenceLevel::High {
        KeyResultStatus::OnTrack
    } else if progress < AT_RISK_THRESHOLD || confidence == ConfidenceLevel::Low {
        KeyResultStatus::AtRisk
    } else if progress < BEHIND_THRESHOLD && confidence != ConfidenceLevel::High {
        KeyResultStatus::Behind
    } else {
        KeyResultStatus::OnTrack
    }
}

/// The full outcome of deriving a key result's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derivation {
    pub direction: Direction,
    pub progress: u8,
    pub target_met: bool,
    pub status: KeyResultStatus,
}

/// Derive progress and status in one pass.
#[must_use]
pub fn derive(start: f64, current: f64, target: f64, confidence: ConfidenceLevel) -> Derivation {
    let progress = compute_progress(start, current, target);
    let met = target_met(start, current, target);
    Derivation {
        direction: Direction::of(start, target),
        progress,
        target_met: met,
        status: derive_status(progress, confidence, met),
    }
}

/// Rounded mean of a set of progress values; 0 for an empty set.
///
/// Rounds half up, integer arithmetic only.
#[must_use]
pub fn rollup<I>(values: I) -> u8
where
    I: IntoIterator<Item = u8>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), v| (sum + u64::from(v), count + 1));
    if count == 0 {
        return 0;
    }
    ((sum * 2 + count) / (count * 2)).min(u64::from(COMPLETE_PROGRESS)) as u8
}
