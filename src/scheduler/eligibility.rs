//! Daily practice eligibility.
//!
//! An insight can be practiced once it has reached stage 2 (or has been
//! mastered), at most once per calendar day. "Day" is the local calendar
//! date, midnight to midnight, not a rolling 24-hour window.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::core::Insight;

/// Stage from which an unmastered insight may be practiced.
pub const MIN_PRACTICE_STAGE: u8 = 2;

/// Whether the insight may be practiced at `now`, using the local time zone.
pub fn is_eligible_for_exercise(insight: &Insight, now: DateTime<Utc>) -> bool {
    is_eligible_for_exercise_in(insight, now, &Local)
}

/// Whether the insight may be practiced at `now`, comparing calendar dates
/// in the given time zone.
pub fn is_eligible_for_exercise_in<Tz: TimeZone>(
    insight: &Insight,
    now: DateTime<Utc>,
    tz: &Tz,
) -> bool {
    if insight.review_stage < MIN_PRACTICE_STAGE && !insight.is_mastered {
        return false;
    }

    match insight.last_exercise_date {
        Some(last) => !same_calendar_day(last, now, tz),
        None => true,
    }
}

fn same_calendar_day<Tz: TimeZone>(a: DateTime<Utc>, b: DateTime<Utc>, tz: &Tz) -> bool {
    a.with_timezone(tz).date_naive() == b.with_timezone(tz).date_naive()
}
