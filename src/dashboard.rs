//! Dashboard summary.
//!
//! Aggregates the collection into the counts shown on the dashboard view.
//! Computed on demand; nothing here is persisted.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

use crate::core::{Insight, MAX_STAGE};
use crate::scheduler::is_eligible_for_exercise_in;

/// Summary statistics for the dashboard view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Number of insights in the collection.
    pub total: usize,
    /// Unmastered insights due at `now`.
    pub due_now: usize,
    pub mastered: usize,
    /// Unmastered insights.
    pub in_progress: usize,
    /// Unmastered insights per review stage.
    pub by_stage: [usize; MAX_STAGE as usize + 1],
    pub eligible_for_practice: usize,
    /// Practice attempts recorded on today's calendar date.
    pub exercises_today: usize,
    /// Share of correct practice attempts, if any were recorded.
    pub exercise_accuracy: Option<f64>,
    /// Earliest upcoming review among unmastered insights.
    pub next_due: Option<DateTime<Utc>>,
}

impl DashboardSummary {
    /// Whether there is anything to review right now.
    pub fn has_due(&self) -> bool {
        self.due_now > 0
    }
}

/// Summarize the collection at `now`, using the local time zone for
/// calendar-day comparisons.
pub fn summarize(insights: &[Insight], now: DateTime<Utc>) -> DashboardSummary {
    summarize_in(insights, now, &Local)
}

/// Summarize the collection at `now`, comparing calendar days in `tz`.
pub fn summarize_in<Tz: TimeZone>(
    insights: &[Insight],
    now: DateTime<Utc>,
    tz: &Tz,
) -> DashboardSummary {
    let today = now.with_timezone(tz).date_naive();
    let mut summary = DashboardSummary {
        total: insights.len(),
        ..Default::default()
    };
    let mut attempts = 0usize;
    let mut correct = 0usize;

    for insight in insights {
        if insight.is_mastered {
            summary.mastered += 1;
        } else {
            summary.in_progress += 1;
            let stage = usize::from(insight.review_stage.min(MAX_STAGE));
            summary.by_stage[stage] += 1;
            if insight.is_due(now) {
                summary.due_now += 1;
            }
            if summary.next_due.is_none_or(|next| insight.next_review < next) {
                summary.next_due = Some(insight.next_review);
            }
        }

        if is_eligible_for_exercise_in(insight, now, tz) {
            summary.eligible_for_practice += 1;
        }

        for attempt in &insight.exercise_history {
            attempts += 1;
            if attempt.correct {
                correct += 1;
            }
            if attempt.timestamp.with_timezone(tz).date_naive() == today {
                summary.exercises_today += 1;
            }
        }
    }

    if attempts > 0 {
        summary.exercise_accuracy = Some(correct as f64 / attempts as f64);
    }

    summary
}
