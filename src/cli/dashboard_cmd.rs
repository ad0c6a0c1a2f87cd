//! Dashboard command for Sprout.
//!
//! Shows collection counts, what is due, and the next insight up for review.

use chrono::Utc;
use serde::Serialize;

use crate::cli::list::InsightInfo;
use crate::core::Controller;
use crate::dashboard::DashboardSummary;
use crate::storage::PersistenceAdapter;
use crate::util::truncate_chars;

/// Options for the dashboard command.
#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the dashboard command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOutput {
    pub success: bool,
    pub summary: DashboardSummary,
    /// Highest-priority due insight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_up: Option<InsightInfo>,
}

/// The dashboard command implementation.
pub struct DashboardCommand<P: PersistenceAdapter> {
    controller: Controller<P>,
}

impl<P: PersistenceAdapter> DashboardCommand<P> {
    /// Create a new dashboard command.
    pub fn new(controller: Controller<P>) -> Self {
        Self { controller }
    }

    /// Run the dashboard command.
    pub fn run(&self, _options: &DashboardOptions) -> DashboardOutput {
        let now = Utc::now();
        let next_up = self
            .controller
            .due(now)
            .first()
            .map(|i| InsightInfo::from_insight(i, now));

        DashboardOutput {
            success: true,
            summary: self.controller.dashboard(now),
            next_up,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &DashboardOutput, options: &DashboardOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        let s = &output.summary;
        if s.total == 0 {
            return "No insights yet. Add one with `sprout add`.\n".to_string();
        }

        let mut lines = Vec::new();
        lines.push("Sprout Dashboard".to_string());
        lines.push("================".to_string());
        lines.push(String::new());
        lines.push(format!(
            "Insights:   {} total, {} in progress, {} mastered",
            s.total, s.in_progress, s.mastered
        ));
        lines.push(format!(
            "Stages:     0: {} | 1: {} | 2: {} | 3: {}",
            s.by_stage[0], s.by_stage[1], s.by_stage[2], s.by_stage[3]
        ));
        lines.push(format!("Due now:    {}", s.due_now));
        if let Some(next) = s.next_due.filter(|_| !s.has_due()) {
            lines.push(format!("Next due:   {}", next.format("%Y-%m-%d %H:%M")));
        }
        lines.push(format!(
            "Practice:   {} eligible today, {} exercise(s) done today",
            s.eligible_for_practice, s.exercises_today
        ));
        if let Some(accuracy) = s.exercise_accuracy {
            lines.push(format!("Accuracy:   {:.0}%", accuracy * 100.0));
        }

        if let Some(insight) = &output.next_up {
            lines.push(String::new());
            lines.push(format!("Up next: {}", truncate_chars(&insight.content, 60)));
            lines.push("Run `sprout review` to start.".to_string());
        }

        lines.push(String::new());
        lines.join("\n")
    }
}
