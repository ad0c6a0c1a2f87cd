//! List command for Sprout.
//!
//! Lists insights in the collection, optionally only due or mastered ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Controller, Insight};
use crate::storage::PersistenceAdapter;
use crate::util::truncate_chars;

/// Characters of content shown per insight in the text listing.
const PREVIEW_CHARS: usize = 72;

/// Options for the list command.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Only insights due now, highest priority first.
    pub due: bool,
    /// Only mastered insights.
    pub mastered: bool,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

/// Output format for the list command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOutput {
    /// Whether the list was successful.
    pub success: bool,
    /// Number of insights listed.
    pub count: usize,
    /// Total insights in the collection.
    pub total: usize,
    /// The insights.
    pub insights: Vec<InsightInfo>,
    /// Error message if listing failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Insight summary shared by the command outputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsightInfo {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub tags: Vec<String>,
    /// Created date (YYYY-MM-DD).
    pub created: String,
    pub stage: u8,
    /// Next review time (YYYY-MM-DD HH:MM UTC).
    pub next_review: String,
    pub mastered: bool,
    pub due: bool,
    pub reviews: usize,
    pub exercises: usize,
}

impl InsightInfo {
    /// Summarize an insight as of `now`.
    pub fn from_insight(insight: &Insight, now: DateTime<Utc>) -> Self {
        Self {
            id: insight.id.clone(),
            content: insight.content.clone(),
            note: insight.note.clone(),
            source: insight.source.clone(),
            tags: insight.tags.clone(),
            created: insight.timestamp.format("%Y-%m-%d").to_string(),
            stage: insight.review_stage,
            next_review: insight.next_review.format("%Y-%m-%d %H:%M").to_string(),
            mastered: insight.is_mastered,
            due: insight.is_due(now),
            reviews: insight.review_count(),
            exercises: insight.exercise_history.len(),
        }
    }

    /// Short status label for text output.
    pub fn status_label(&self) -> String {
        if self.mastered {
            "mastered".to_string()
        } else if self.due {
            format!("stage {}, due", self.stage)
        } else {
            format!("stage {}, next {}", self.stage, self.next_review)
        }
    }
}

impl ListOutput {
    /// Create a successful output.
    pub fn success(insights: Vec<InsightInfo>, total: usize) -> Self {
        Self {
            success: true,
            count: insights.len(),
            total,
            insights,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            count: 0,
            total: 0,
            insights: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The list command implementation.
pub struct ListCommand<P: PersistenceAdapter> {
    controller: Controller<P>,
}

impl<P: PersistenceAdapter> ListCommand<P> {
    /// Create a new list command.
    pub fn new(controller: Controller<P>) -> Self {
        Self { controller }
    }

    /// Run the list command.
    pub fn run(&self, options: &ListOptions) -> ListOutput {
        let now = Utc::now();
        let total = self.controller.insights().len();

        if options.due && options.mastered {
            return ListOutput::failure("--due and --mastered cannot be combined");
        }

        let mut insights: Vec<&Insight> = if options.due {
            self.controller.due(now)
        } else {
            let mut all: Vec<&Insight> = self
                .controller
                .insights()
                .iter()
                .filter(|i| !options.mastered || i.is_mastered)
                .collect();
            // Most recent first
            all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            all
        };

        if let Some(limit) = options.limit {
            insights.truncate(limit);
        }

        let infos = insights
            .into_iter()
            .map(|i| InsightInfo::from_insight(i, now))
            .collect();
        ListOutput::success(infos, total)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ListOutput, options: &ListOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output, options)
        }
    }

    fn format_human_readable(&self, output: &ListOutput, options: &ListOptions) -> String {
        if !output.success {
            return format!(
                "List failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.insights.is_empty() {
            return if options.due {
                "Nothing due for review.\n".to_string()
            } else if options.mastered {
                "No mastered insights yet.\n".to_string()
            } else {
                "No insights yet. Add one with `sprout add`.\n".to_string()
            };
        }

        let mut lines = Vec::new();
        if options.due {
            lines.push(format!("{} insight(s) due for review:\n", output.count));
        } else {
            lines.push(format!(
                "Showing {} of {} insight(s):\n",
                output.count, output.total
            ));
        }

        for (i, insight) in output.insights.iter().enumerate() {
            lines.push(format!(
                "{}. {} [{}]",
                i + 1,
                truncate_chars(&insight.content, PREVIEW_CHARS),
                insight.status_label()
            ));
            if !insight.tags.is_empty() {
                lines.push(format!("   Tags: {}", insight.tags.join(", ")));
            }
            lines.push(format!(
                "   Created: {} | ID: {}",
                insight.created, insight.id
            ));
            lines.push(String::new());
        }

        lines.join("\n")
    }
}
