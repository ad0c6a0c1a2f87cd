//! Spaced-repetition scheduling for Sprout.
//!
//! Review intervals come from a fixed 4-entry table indexed by review
//! stage: 1, 3, 7 and 21 days. Everything here is a pure function of an
//! insight and a caller-supplied `now`; only [`next_review_timestamp`]
//! reads the clock.

pub mod eligibility;
pub mod priority;
pub mod review;

use chrono::{DateTime, Duration, Utc};

pub use eligibility::{is_eligible_for_exercise, is_eligible_for_exercise_in};
pub use priority::{calculate_priority, due_by_priority, next_due, weights, PrioritizedInsight};
pub use review::{apply_review, review_patch, ReviewOutcome};

/// Review interval in days for each stage.
pub const INTERVAL_DAYS: [i64; 4] = [1, 3, 7, 21];

/// Interval used for stages outside the table.
pub const FALLBACK_INTERVAL_DAYS: i64 = 1;

/// Milliseconds in a day, used for fractional day arithmetic.
pub const DAY_MS: f64 = 86_400_000.0;

/// Interval in days for a review stage.
///
/// Stages past the end of the table fall back to one day.
pub fn interval_days(stage: u8) -> i64 {
    INTERVAL_DAYS
        .get(stage as usize)
        .copied()
        .unwrap_or(FALLBACK_INTERVAL_DAYS)
}

/// Next review time for `stage`, counted from `now`.
pub fn next_review_from(stage: u8, now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(interval_days(stage))
}

/// Next review time for `stage`, counted from the current time.
pub fn next_review_timestamp(stage: u8) -> DateTime<Utc> {
    next_review_from(stage, Utc::now())
}

/// Fractional days from `earlier` to `later` (negative if reversed).
pub(crate) fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / DAY_MS
}
