//! Review transitions.
//!
//! State is `(stage, mastered)`:
//!
//! ```text
//! (s, false) --remembered--> (min(s+1, 3), false)   due in interval[s+1]
//! (s, false) --struggled---> (s, false)             due in interval[s], from now
//! (s, false) --mastered----> (s, true)              terminal
//! ```
//!
//! Every transition appends to the review log. No transition leaves the
//! mastered state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Insight, InsightPatch, ReviewAction, ReviewEvent, MAX_STAGE};
use crate::error::{Result, SproutError};
use crate::scheduler::next_review_from;

/// The user's answer at the end of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// Remembered well: advance a stage.
    Remembered,
    /// Needs more review: stay at the same stage, rescheduled from now.
    Struggled,
    /// Mark as mastered: stop scheduling.
    Mastered,
}

impl ReviewOutcome {
    /// Stable identifier used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewOutcome::Remembered => "remembered",
            ReviewOutcome::Struggled => "struggled",
            ReviewOutcome::Mastered => "mastered",
        }
    }
}

impl fmt::Display for ReviewOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewOutcome {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "remembered" | "good" => Ok(ReviewOutcome::Remembered),
            "struggled" | "again" => Ok(ReviewOutcome::Struggled),
            "mastered" => Ok(ReviewOutcome::Mastered),
            other => Err(SproutError::validation(format!(
                "unknown review outcome '{}'",
                other
            ))),
        }
    }
}

/// Compute the patch a review outcome applies to an insight.
///
/// Fails for mastered insights, which are out of the schedule for good.
pub fn review_patch(
    insight: &Insight,
    outcome: ReviewOutcome,
    now: DateTime<Utc>,
) -> Result<InsightPatch> {
    if insight.is_mastered {
        return Err(SproutError::invalid_state(format!(
            "insight {} is mastered and no longer reviewed",
            insight.id
        )));
    }

    let patch = match outcome {
        ReviewOutcome::Remembered => {
            let stage = insight.review_stage.saturating_add(1).min(MAX_STAGE);
            InsightPatch {
                review_stage: Some(stage),
                next_review: Some(next_review_from(stage, now)),
                append_review: vec![ReviewEvent::new(ReviewAction::Reviewed, now)],
                ..Default::default()
            }
        }
        ReviewOutcome::Struggled => InsightPatch {
            next_review: Some(next_review_from(insight.review_stage, now)),
            append_review: vec![ReviewEvent::new(ReviewAction::Reviewed, now)],
            ..Default::default()
        },
        ReviewOutcome::Mastered => InsightPatch {
            mastered: Some(true),
            append_review: vec![ReviewEvent::new(ReviewAction::Mastered, now)],
            ..Default::default()
        },
    };

    Ok(patch)
}

/// Apply a review outcome to an insight in place.
pub fn apply_review(
    insight: &mut Insight,
    outcome: ReviewOutcome,
    now: DateTime<Utc>,
) -> Result<()> {
    let patch = review_patch(insight, outcome, now)?;
    insight.apply_patch(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InsightDraft;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 2, 10, 0, 0).unwrap()
    }

    fn fresh() -> Insight {
        Insight::new(
            InsightDraft::new("Write things down to free your mind."),
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_created_then_remembered_once() {
        let mut insight = fresh();
        assert_eq!(insight.next_review, now() + Duration::days(1));

        apply_review(&mut insight, ReviewOutcome::Remembered, now()).unwrap();

        assert_eq!(insight.review_stage, 1);
        assert_eq!(insight.next_review, now() + Duration::days(3));
        assert_eq!(insight.review_history.len(), 2);
        assert_eq!(insight.review_history[1].action, ReviewAction::Reviewed);
        assert_eq!(insight.review_history[1].timestamp, now());
    }

    #[test]
    fn test_remembered_caps_at_stage_three() {
        let mut insight = fresh();
        for i in 0..5 {
            let t = now() + Duration::days(i * 30);
            apply_review(&mut insight, ReviewOutcome::Remembered, t).unwrap();
        }

        assert_eq!(insight.review_stage, 3);
        assert_eq!(
            insight.next_review,
            now() + Duration::days(4 * 30) + Duration::days(21)
        );
        assert_eq!(insight.review_count(), 5);
    }

    #[test]
    fn test_struggled_keeps_stage_and_reschedules_from_now() {
        let mut insight = fresh();
        insight.review_stage = 2;
        let later = now() + Duration::days(10);

        apply_review(&mut insight, ReviewOutcome::Struggled, later).unwrap();

        assert_eq!(insight.review_stage, 2);
        assert_eq!(insight.next_review, later + Duration::days(7));
        assert_eq!(
            insight.review_history.last().unwrap().action,
            ReviewAction::Reviewed
        );
    }

    #[test]
    fn test_mastered_leaves_schedule_untouched() {
        let mut insight = fresh();
        insight.review_stage = 1;
        let next = insight.next_review;

        apply_review(&mut insight, ReviewOutcome::Mastered, now()).unwrap();

        assert!(insight.is_mastered);
        assert_eq!(insight.review_stage, 1);
        assert_eq!(insight.next_review, next);
        assert_eq!(
            insight.review_history.last().unwrap().action,
            ReviewAction::Mastered
        );
    }

    #[test]
    fn test_mastered_insight_cannot_be_reviewed() {
        let mut insight = fresh();
        apply_review(&mut insight, ReviewOutcome::Mastered, now()).unwrap();

        for outcome in [
            ReviewOutcome::Remembered,
            ReviewOutcome::Struggled,
            ReviewOutcome::Mastered,
        ] {
            let err = apply_review(&mut insight, outcome, now()).unwrap_err();
            assert!(matches!(err, SproutError::InvalidState { .. }));
        }
        assert_eq!(insight.review_history.len(), 2);
    }

    #[test]
    fn test_outcome_from_str() {
        assert_eq!(
            "remembered".parse::<ReviewOutcome>().unwrap(),
            ReviewOutcome::Remembered
        );
        assert_eq!(
            "Struggled".parse::<ReviewOutcome>().unwrap(),
            ReviewOutcome::Struggled
        );
        assert_eq!(
            "mastered".parse::<ReviewOutcome>().unwrap(),
            ReviewOutcome::Mastered
        );
        assert!("maybe".parse::<ReviewOutcome>().is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_outcome() -> impl Strategy<Value = ReviewOutcome> {
            prop_oneof![
                Just(ReviewOutcome::Remembered),
                Just(ReviewOutcome::Struggled),
            ]
        }

        proptest! {
            // Stage stays in range and never decreases under any sequence
            // of non-mastering outcomes.
            #[test]
            fn prop_stage_monotone_and_bounded(outcomes in prop::collection::vec(arb_outcome(), 0..20)) {
                let mut insight = fresh();
                let mut previous = insight.review_stage;
                for outcome in outcomes {
                    apply_review(&mut insight, outcome, now()).unwrap();
                    prop_assert!(insight.review_stage <= MAX_STAGE);
                    prop_assert!(insight.review_stage >= previous);
                    previous = insight.review_stage;
                }
                prop_assert_eq!(insight.review_history[0].action, ReviewAction::Created);
            }
        }
    }
}
