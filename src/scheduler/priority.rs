//! Review priority ranking.
//!
//! Priority is a weighted sum, higher sorts first:
//!
//! ```text
//! priority = days_overdue * 10 + review_stage * (-2) + recency_bonus * 5
//! days_overdue  = max(0, (now - next_review) / 1 day)
//! recency_bonus = max(0, 1 - days_since_creation / 30)
//! ```
//!
//! Overdue time dominates. The stage term is a tie-break, and the recency
//! bonus decays linearly to zero over the first 30 days. Equal priorities
//! keep their input order.

use chrono::{DateTime, Utc};

use crate::core::Insight;
use crate::scheduler::days_between;

/// Score weights for review priority.
pub mod weights {
    /// Weight per day overdue.
    pub const OVERDUE: f64 = 10.0;
    /// Weight per review stage.
    pub const STAGE: f64 = -2.0;
    /// Weight for the recency bonus (bonus is in `[0, 1]`).
    pub const RECENCY: f64 = 5.0;
    /// Days over which the recency bonus decays to zero.
    pub const RECENCY_WINDOW_DAYS: f64 = 30.0;
}

/// Calculate the review priority of an insight at `now`.
pub fn calculate_priority(insight: &Insight, now: DateTime<Utc>) -> f64 {
    let days_overdue = days_between(insight.next_review, now).max(0.0);
    let days_since_creation = days_between(insight.timestamp, now);
    let recency_bonus = (1.0 - days_since_creation / weights::RECENCY_WINDOW_DAYS).max(0.0);

    combine(days_overdue, insight.review_stage, recency_bonus)
}

fn combine(days_overdue: f64, stage: u8, recency_bonus: f64) -> f64 {
    days_overdue * weights::OVERDUE
        + f64::from(stage) * weights::STAGE
        + recency_bonus * weights::RECENCY
}

/// An insight reference with its computed priority.
#[derive(Debug, Clone)]
pub struct PrioritizedInsight<'a> {
    pub insight: &'a Insight,
    pub priority: f64,
}

/// Due insights ordered by priority, highest first.
///
/// Mastered insights and insights not yet due are excluded. The sort is
/// stable, so ties keep collection order.
pub fn due_by_priority(insights: &[Insight], now: DateTime<Utc>) -> Vec<PrioritizedInsight<'_>> {
    let mut due: Vec<PrioritizedInsight<'_>> = insights
        .iter()
        .filter(|i| i.is_due(now))
        .map(|insight| PrioritizedInsight {
            insight,
            priority: calculate_priority(insight, now),
        })
        .collect();

    due.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    due
}

/// The single highest-priority due insight, skipping `exclude` if given.
pub fn next_due<'a>(
    insights: &'a [Insight],
    now: DateTime<Utc>,
    exclude: Option<&str>,
) -> Option<&'a Insight> {
    due_by_priority(insights, now)
        .into_iter()
        .map(|p| p.insight)
        .find(|i| Some(i.id.as_str()) != exclude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InsightDraft;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
    }

    fn make(created_days_ago: i64, overdue_days: f64, stage: u8) -> Insight {
        let created = now() - Duration::days(created_days_ago);
        let mut insight =
            Insight::new(InsightDraft::new("Consistency beats intensity."), created).unwrap();
        insight.review_stage = stage;
        insight.next_review = now() - Duration::milliseconds((overdue_days * 86_400_000.0) as i64);
        insight
    }

    #[test]
    fn test_priority_formula() {
        // 2 days overdue, stage 1, created 15 days ago: bonus = 0.5
        let insight = make(15, 2.0, 1);
        let p = calculate_priority(&insight, now());
        let expected = 2.0 * 10.0 - 2.0 + 0.5 * 5.0;
        assert!((p - expected).abs() < 1e-9, "got {}", p);
    }

    #[test]
    fn test_not_yet_due_has_no_overdue_term() {
        let mut insight = make(60, 0.0, 0);
        insight.next_review = now() + Duration::days(5);
        assert!(calculate_priority(&insight, now()).abs() < 1e-9);
    }

    #[test]
    fn test_recency_bonus_caps_at_five() {
        let insight = make(0, 0.0, 0);
        assert!((calculate_priority(&insight, now()) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_recency_bonus_gone_after_window() {
        let insight = make(45, 0.0, 0);
        assert!(calculate_priority(&insight, now()).abs() < 1e-9);
    }

    #[test]
    fn test_due_by_priority_orders_descending() {
        let a = make(60, 1.0, 0); // 10
        let b = make(60, 3.0, 0); // 30
        let c = make(60, 2.0, 0); // 20
        let insights = vec![a.clone(), b.clone(), c.clone()];

        let ranked = due_by_priority(&insights, now());

        let ids: Vec<&str> = ranked.iter().map(|p| p.insight.id.as_str()).collect();
        assert_eq!(ids, vec![b.id.as_str(), c.id.as_str(), a.id.as_str()]);
    }

    #[test]
    fn test_due_by_priority_excludes_mastered_and_future() {
        let due = make(60, 1.0, 0);
        let mut mastered = make(60, 5.0, 0);
        mastered.is_mastered = true;
        let mut future = make(60, 0.0, 0);
        future.next_review = now() + Duration::hours(1);

        let insights = vec![due.clone(), mastered, future];
        let ranked = due_by_priority(&insights, now());

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].insight.id, due.id);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let a = make(60, 1.0, 1);
        let b = make(60, 1.0, 1);
        let c = make(60, 1.0, 1);
        let insights = vec![a.clone(), b.clone(), c.clone()];

        let ranked = due_by_priority(&insights, now());
        let ids: Vec<&str> = ranked.iter().map(|p| p.insight.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), b.id.as_str(), c.id.as_str()]);
    }

    #[test]
    fn test_next_due_with_exclusion() {
        let top = make(60, 4.0, 0);
        let second = make(60, 2.0, 0);
        let insights = vec![second.clone(), top.clone()];

        assert_eq!(next_due(&insights, now(), None).unwrap().id, top.id);
        assert_eq!(
            next_due(&insights, now(), Some(&top.id)).unwrap().id,
            second.id
        );
        assert!(next_due(&[top.clone()], now(), Some(&top.id)).is_none());
    }

    // =========================================================================
    // Property-based tests
    // =========================================================================

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_increasing_in_overdue(
                overdue in 0.0f64..100.0,
                extra in 0.001f64..50.0,
                stage in 0u8..=3,
                bonus in 0.0f64..=1.0,
            ) {
                prop_assert!(combine(overdue + extra, stage, bonus) > combine(overdue, stage, bonus));
            }

            #[test]
            fn prop_increasing_in_recency(
                overdue in 0.0f64..100.0,
                stage in 0u8..=3,
                bonus in 0.0f64..0.99,
                extra in 0.001f64..0.01,
            ) {
                prop_assert!(combine(overdue, stage, bonus + extra) > combine(overdue, stage, bonus));
            }

            #[test]
            fn prop_decreasing_in_stage(
                overdue in 0.0f64..100.0,
                stage in 0u8..3,
                bonus in 0.0f64..=1.0,
            ) {
                prop_assert!(combine(overdue, stage + 1, bonus) < combine(overdue, stage, bonus));
            }

            #[test]
            fn prop_later_now_never_lowers_overdue_term(
                created_days_ago in 31i64..365,
                hours in 0i64..2000,
            ) {
                let insight = make(created_days_ago, 0.0, 2);
                let later = now() + Duration::hours(hours);
                prop_assert!(calculate_priority(&insight, later) >= calculate_priority(&insight, now()));
            }
        }
    }
}
