//! # Property-Based Tests
//!
//! Invariants of the progress derivation and rollup, checked with proptest.

use okr_core::progress::{compute_progress, derive_status, rollup, target_met};
use okr_core::{ConfidenceLevel, KeyResultStatus};
use proptest::collection::vec;
use proptest::prelude::*;

fn confidence() -> impl Strategy<Value = ConfidenceLevel> {
    prop_oneof![
        Just(ConfidenceLevel::Low),
        Just(ConfidenceLevel::Medium),
        Just(ConfidenceLevel::High),
    ]
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Progress never leaves 0..=100, whatever the inputs.
    #[test]
    fn progress_is_bounded(
        start in -1.0e9f64..1.0e9,
        current in -1.0e9f64..1.0e9,
        target in -1.0e9f64..1.0e9,
    ) {
        let p = compute_progress(start, current, target);
        prop_assert!(p <= 100);
    }

    /// For increasing metrics progress matches the rounded, clamped ratio.
    #[test]
    fn increasing_progress_matches_formula(
        start in -1000i32..1000,
        span in 1i32..1000,
        current in -3000i32..3000,
    ) {
        let start = f64::from(start);
        let target = start + f64::from(span);
        let current = f64::from(current);

        let expected = ((current - start) / (target - start) * 100.0)
            .round()
            .clamp(0.0, 100.0) as u8;
        prop_assert_eq!(compute_progress(start, current, target), expected);
    }

    /// Moving the current value toward the target never lowers progress.
    #[test]
    fn progress_is_monotonic_toward_target(
        start in -1000i32..1000,
        span in 1i32..1000,
        a in -3000i32..3000,
        b in -3000i32..3000,
    ) {
        let start = f64::from(start);
        let target = start + f64::from(span);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            compute_progress(start, f64::from(low), target)
                <= compute_progress(start, f64::from(high), target)
        );
    }

    /// A decreasing metric is the mirror image of an increasing one.
    #[test]
    fn decreasing_mirrors_increasing(
        start in -1000i32..1000,
        span in 1i32..1000,
        current in -3000i32..3000,
    ) {
        let start = f64::from(start);
        let span = f64::from(span);
        let current = f64::from(current);

        let increasing = compute_progress(start, current, start + span);
        let decreasing = compute_progress(-start, -current, -start - span);
        prop_assert_eq!(increasing, decreasing);
    }

    /// A met target is always completed, and completed means the target is met.
    #[test]
    fn completed_iff_target_met(
        start in -1000i32..1000,
        current in -1000i32..1000,
        target in -1000i32..1000,
        level in confidence(),
    ) {
        let (start, current, target) = (f64::from(start), f64::from(current), f64::from(target));
        let met = target_met(start, current, target);
        let status = derive_status(compute_progress(start, current, target), level, met);
        prop_assert_eq!(status == KeyResultStatus::Completed, met);
    }

    /// Low confidence never reports on track unless the target is met.
    #[test]
    fn low_confidence_is_never_on_track(progress in 0u8..=100) {
        prop_assert_ne!(
            derive_status(progress, ConfidenceLevel::Low, false),
            KeyResultStatus::OnTrack
        );
    }

    /// The rollup lies between the smallest and largest value.
    #[test]
    fn rollup_is_between_min_and_max(values in vec(0u8..=100, 1..50)) {
        let r = rollup(values.iter().copied());
        let min = values.iter().copied().min().unwrap_or(0);
        let max = values.iter().copied().max().unwrap_or(0);
        prop_assert!(min <= r && r <= max);
    }

    /// The rollup of identical values is that value.
    #[test]
    fn rollup_of_constant_is_constant(value in 0u8..=100, n in 1usize..50) {
        prop_assert_eq!(rollup(std::iter::repeat_n(value, n)), value);
    }
}
