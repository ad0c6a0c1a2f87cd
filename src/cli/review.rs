//! Review command for Sprout.
//!
//! Without an outcome, shows the highest-priority due insight. With an
//! outcome, records it for that insight and shows the next one.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::cli::list::InsightInfo;
use crate::core::{Controller, NavigationOutcome, NavigationTarget};
use crate::scheduler::ReviewOutcome;
use crate::storage::PersistenceAdapter;

/// Options for the review command.
#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Outcome to record for the current insight.
    pub outcome: Option<ReviewOutcome>,
}

/// What was recorded for the reviewed insight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedInfo {
    pub id: String,
    pub outcome: String,
    pub stage: u8,
    pub next_review: String,
    pub mastered: bool,
}

/// Output format for the review command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutput {
    pub success: bool,
    /// Set when an outcome was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed: Option<ReviewedInfo>,
    /// The insight now up for review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<InsightInfo>,
    /// Due insights remaining, including `current`.
    pub remaining: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReviewOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            reviewed: None,
            current: None,
            remaining: 0,
            error: Some(error.into()),
        }
    }
}

/// The review command implementation.
pub struct ReviewCommand<P: PersistenceAdapter> {
    controller: Controller<P>,
}

impl<P: PersistenceAdapter> ReviewCommand<P> {
    /// Create a new review command.
    pub fn new(controller: Controller<P>) -> Self {
        Self { controller }
    }

    /// Run the review command.
    pub fn run(&mut self, options: &ReviewOptions) -> ReviewOutput {
        let now = Utc::now();

        let current_id = match self.controller.navigate(NavigationTarget::Review, now) {
            Ok(NavigationOutcome::Entered(view)) => view.insight_id().map(str::to_string),
            Ok(NavigationOutcome::NothingToReview) => None,
            Err(e) => return ReviewOutput::failure(e.to_string()),
        };

        let mut reviewed = None;
        if let (Some(outcome), Some(id)) = (options.outcome, current_id.as_deref()) {
            match self.controller.record_review(id, outcome, now) {
                Ok(insight) => {
                    reviewed = Some(ReviewedInfo {
                        id: insight.id.clone(),
                        outcome: outcome.to_string(),
                        stage: insight.review_stage,
                        next_review: insight.next_review.format("%Y-%m-%d %H:%M").to_string(),
                        mastered: insight.is_mastered,
                    });
                }
                Err(e) => return ReviewOutput::failure(e.to_string()),
            }
        }

        // Recording a review moves the view on to the next due insight
        let current = self
            .controller
            .view()
            .insight_id()
            .and_then(|id| self.controller.get(id))
            .map(|i| InsightInfo::from_insight(i, now));

        ReviewOutput {
            success: true,
            reviewed,
            current,
            remaining: self.controller.due(now).len(),
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ReviewOutput, options: &ReviewOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "Review failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut lines = Vec::new();

        if let Some(reviewed) = &output.reviewed {
            if reviewed.mastered {
                lines.push(format!("Marked {} as mastered.", reviewed.id));
            } else {
                lines.push(format!(
                    "Recorded '{}' for {}: stage {}, next review {}.",
                    reviewed.outcome, reviewed.id, reviewed.stage, reviewed.next_review
                ));
            }
            lines.push(String::new());
        }

        match &output.current {
            Some(insight) => {
                lines.push(format!("Review ({} due)", output.remaining));
                lines.push(String::new());
                lines.push(format!("  {}", insight.content));
                if let Some(source) = &insight.source {
                    lines.push(format!("  (source: {})", source));
                }
                if let Some(note) = &insight.note {
                    lines.push(format!("  Note: {}", note));
                }
                lines.push(String::new());
                lines.push(format!(
                    "Stage {} | {} previous review(s) | ID: {}",
                    insight.stage, insight.reviews, insight.id
                ));
                lines.push(
                    "Record with: sprout review --outcome remembered|struggled|mastered"
                        .to_string(),
                );
            }
            None if output.reviewed.is_some() => {
                lines.push("All caught up. Nothing else is due.".to_string());
            }
            None => lines.push("Nothing to review right now.".to_string()),
        }

        lines.push(String::new());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InsightDraft;
    use crate::storage::MemoryAdapter;
    use chrono::{DateTime, Duration};
    use std::sync::Arc;

    fn setup(ages: &[i64]) -> (Arc<MemoryAdapter>, Vec<String>) {
        let adapter = Arc::new(MemoryAdapter::new());
        let mut controller = Controller::new(Arc::clone(&adapter), "local");
        let ids = ages
            .iter()
            .map(|days| {
                let at: DateTime<Utc> = Utc::now() - Duration::days(*days);
                controller
                    .add(InsightDraft::new(format!("Insight created {} days ago", days)), at)
                    .unwrap()
                    .id
                    .clone()
            })
            .collect();
        (adapter, ids)
    }

    #[test]
    fn test_shows_highest_priority_without_recording() {
        let (adapter, ids) = setup(&[3, 10]);
        let mut cmd = ReviewCommand::new(Controller::load(adapter, "local"));
        let options = ReviewOptions::default();

        let output = cmd.run(&options);

        assert!(output.success);
        assert!(output.reviewed.is_none());
        assert_eq!(output.current.as_ref().unwrap().id, ids[1]);
        assert_eq!(output.remaining, 2);
        assert!(cmd.format_output(&output, &options).contains("Review (2 due)"));
    }

    #[test]
    fn test_records_outcome_and_moves_on() {
        let (adapter, ids) = setup(&[3, 10]);
        let mut cmd = ReviewCommand::new(Controller::load(Arc::clone(&adapter), "local"));
        let options = ReviewOptions {
            outcome: Some(ReviewOutcome::Remembered),
            ..Default::default()
        };

        let output = cmd.run(&options);

        let reviewed = output.reviewed.as_ref().unwrap();
        assert_eq!(reviewed.id, ids[1]);
        assert_eq!(reviewed.stage, 1);
        assert_eq!(output.current.as_ref().unwrap().id, ids[0]);
        assert_eq!(output.remaining, 1);

        let stored = Controller::load(adapter, "local");
        assert_eq!(stored.get(&ids[1]).unwrap().review_stage, 1);
    }

    #[test]
    fn test_last_review_finishes_session() {
        let (adapter, _) = setup(&[3]);
        let mut cmd = ReviewCommand::new(Controller::load(adapter, "local"));
        let options = ReviewOptions {
            outcome: Some(ReviewOutcome::Mastered),
            ..Default::default()
        };

        let output = cmd.run(&options);

        assert!(output.reviewed.as_ref().unwrap().mastered);
        assert!(output.current.is_none());
        assert_eq!(output.remaining, 0);
        let text = cmd.format_output(&output, &options);
        assert!(text.contains("as mastered"));
        assert!(text.contains("All caught up"));
    }

    #[test]
    fn test_nothing_to_review() {
        let (adapter, _) = setup(&[0]);
        let mut cmd = ReviewCommand::new(Controller::load(adapter, "local"));
        let options = ReviewOptions {
            outcome: Some(ReviewOutcome::Remembered),
            ..Default::default()
        };

        let output = cmd.run(&options);

        assert!(output.success);
        assert!(output.reviewed.is_none());
        assert!(output.current.is_none());
        assert!(cmd
            .format_output(&output, &options)
            .contains("Nothing to review"));
    }
}
