//! # Primitives
//!
//! Fixed thresholds and input limits for the OKR tracker, plus the text
//! normalisation every document applies to its free-text fields.

use crate::OkrError;

/// Progress value of a finished key result.
pub const COMPLETE_PROGRESS: u8 = 100;

/// Progress at or above which a high-confidence key result is on track.
pub const ON_TRACK_THRESHOLD: u8 = 75;

/// Progress below which a key result without high confidence is behind.
pub const BEHIND_THRESHOLD: u8 = 50;

/// Progress below which a key result is at risk regardless of confidence.
pub const AT_RISK_THRESHOLD: u8 = 25;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for titles and names.
pub const MAX_TITLE_LENGTH: usize = 256;

/// Maximum length for descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 4096;

/// Maximum length for confidence notes and metric units.
pub const MAX_NOTE_LENGTH: usize = 1024;

/// Maximum number of members on a single team.
pub const MAX_TEAM_MEMBERS: usize = 1000;

// =============================================================================
// TEXT NORMALISATION
// =============================================================================

/// Trim a required text field and check it is non-empty and within `max` bytes.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, OkrError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OkrError::Validation(format!("{} is required", field)));
    }
    if trimmed.len() > max {
        return Err(OkrError::Validation(format!(
            "{} length {} exceeds maximum {} bytes",
            field,
            trimmed.len(),
            max
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field. Blank input becomes `None`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, OkrError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => required_text(field, trimmed, max).map(Some),
    }
}

/// Normalise an email address: trimmed, lowercased, must contain `@`.
pub fn normalize_email(value: &str) -> Result<String, OkrError> {
    let email = required_text("email", value, MAX_TITLE_LENGTH)?.to_lowercase();
    if !email.contains('@') {
        return Err(OkrError::Validation(format!("invalid email '{}'", email)));
    }
    Ok(email)
}
