//! # Key Results
//!
//! A key result is a measurable metric under an objective. Its progress and
//! status are never set directly: [`KeyResult::recompute`] derives them from
//! the three values and the confidence level every time the document is
//! saved. Confidence and value changes are kept as append-only histories.

use crate::primitives::{
    MAX_DESCRIPTION_LENGTH, MAX_NOTE_LENGTH, MAX_TITLE_LENGTH, optional_text, required_text,
};
use crate::progress::{self, Derivation};
use crate::{ConfidenceLevel, KeyResultId, KeyResultStatus, MetricType, ObjectiveId, OkrError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded confidence level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceEntry {
    pub level: ConfidenceLevel,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One recorded current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub value: f64,
    pub date: DateTime<Utc>,
}

/// A measurable metric tracking an objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyResult {
    pub id: KeyResultId,
    pub objective: ObjectiveId,
    pub title: String,
    pub description: Option<String>,
    pub metric_type: MetricType,
    pub start_value: f64,
    pub target_value: f64,
    pub current_value: f64,
    /// Derived, `0..=100`.
    pub progress: u8,
    /// Derived.
    pub status: KeyResultStatus,
    pub confidence_level: ConfidenceLevel,
    pub confidence_history: Vec<ConfidenceEntry>,
    pub progress_history: Vec<ProgressEntry>,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a key result. The current value starts at the start
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct NewKeyResult {
    pub objective: ObjectiveId,
    pub title: String,
    pub description: Option<String>,
    pub metric_type: MetricType,
    pub start_value: f64,
    pub target_value: f64,
    pub confidence_level: Option<ConfidenceLevel>,
    pub unit: Option<String>,
}

/// Partial update of a key result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyResultPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub metric_type: Option<MetricType>,
    pub start_value: Option<f64>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub confidence_level: Option<ConfidenceLevel>,
    pub unit: Option<Option<String>>,
}

fn finite(field: &str, value: f64) -> Result<f64, OkrError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(OkrError::Validation(format!("{} must be a finite number", field)))
    }
}

impl KeyResult {
    pub fn new(id: KeyResultId, input: &NewKeyResult, now: DateTime<Utc>) -> Result<Self, OkrError> {
        let start_value = finite("startValue", input.start_value)?;
        let target_value = finite("targetValue", input.target_value)?;
        let confidence_level = input.confidence_level.unwrap_or_default();

        let mut key_result = Self {
            id,
            objective: input.objective,
            title: required_text("title", &input.title, MAX_TITLE_LENGTH)?,
            description: optional_text(
                "description",
                input.description.as_deref(),
                MAX_DESCRIPTION_LENGTH,
            )?,
            metric_type: input.metric_type,
            start_value,
            target_value,
            current_value: start_value,
            progress: 0,
            status: KeyResultStatus::default(),
            confidence_level,
            confidence_history: vec![ConfidenceEntry {
                level: confidence_level,
                note: None,
                timestamp: now,
            }],
            progress_history: vec![ProgressEntry {
                value: start_value,
                date: now,
            }],
            unit: optional_text("unit", input.unit.as_deref(), MAX_NOTE_LENGTH)?,
            created_at: now,
            updated_at: now,
        };
        key_result.recompute();
        Ok(key_result)
    }

    /// Re-derive progress and status from the current values.
    pub fn recompute(&mut self) -> Derivation {
        let derivation = progress::derive(
            self.start_value,
            self.current_value,
            self.target_value,
            self.confidence_level,
        );
        self.progress = derivation.progress;
        self.status = derivation.status;

        tracing::debug!(
            key_result = %self.id,
            title = %self.title,
            direction = derivation.direction.as_str(),
            start = self.start_value,
            current = self.current_value,
            target = self.target_value,
            progress = derivation.progress,
            target_met = derivation.target_met,
            status = derivation.status.as_str(),
            "key result recomputed"
        );
        derivation
    }

    /// Apply a patch, record history for changed values, and recompute.
    /// On error `self` is left unchanged.
    pub fn apply_patch(&mut self, patch: &KeyResultPatch, now: DateTime<Utc>) -> Result<(), OkrError> {
        let mut next = self.clone();
        if let Some(title) = &patch.title {
            next.title = required_text("title", title, MAX_TITLE_LENGTH)?;
        }
        if let Some(description) = &patch.description {
            next.description =
                optional_text("description", description.as_deref(), MAX_DESCRIPTION_LENGTH)?;
        }
        if let Some(metric_type) = patch.metric_type {
            next.metric_type = metric_type;
        }
        if let Some(start) = patch.start_value {
            next.start_value = finite("startValue", start)?;
        }
        if let Some(target) = patch.target_value {
            next.target_value = finite("targetValue", target)?;
        }
        if let Some(unit) = &patch.unit {
            next.unit = optional_text("unit", unit.as_deref(), MAX_NOTE_LENGTH)?;
        }
        if let Some(current) = patch.current_value {
            let current = finite("currentValue", current)?;
            if current != next.current_value {
                next.current_value = current;
                next.progress_history.push(ProgressEntry {
                    value: current,
                    date: now,
                });
            }
        }
        if let Some(level) = patch.confidence_level.filter(|l| *l != next.confidence_level) {
            next.confidence_level = level;
            next.confidence_history.push(ConfidenceEntry {
                level,
                note: None,
                timestamp: now,
            });
        }
        next.updated_at = now;
        next.recompute();
        *self = next;
        Ok(())
    }

    /// Set the confidence level and record exactly one history entry.
    pub fn update_confidence(
        &mut self,
        level: ConfidenceLevel,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), OkrError> {
        let note = optional_text("note", note, MAX_NOTE_LENGTH)?;
        self.confidence_level = level;
        self.confidence_history.push(ConfidenceEntry {
            level,
            note,
            timestamp: now,
        });
        self.updated_at = now;
        self.recompute();
        Ok(())
    }
}
