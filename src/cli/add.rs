//! Add command for Sprout.
//!
//! Captures a new insight. It becomes due for its first review one day
//! later.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::cli::list::InsightInfo;
use crate::core::{Controller, InsightDraft};
use crate::storage::PersistenceAdapter;

/// Options for the add command.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Personal note.
    pub note: Option<String>,
    /// Where the insight came from.
    pub source: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
}

/// Output format for the add command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddOutput {
    /// Whether the insight was added.
    pub success: bool,
    /// The new insight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<InsightInfo>,
    /// Error message if adding failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AddOutput {
    pub fn success(insight: InsightInfo) -> Self {
        Self {
            success: true,
            insight: Some(insight),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            insight: None,
            error: Some(error.into()),
        }
    }
}

/// The add command implementation.
pub struct AddCommand<P: PersistenceAdapter> {
    controller: Controller<P>,
}

impl<P: PersistenceAdapter> AddCommand<P> {
    /// Create a new add command.
    pub fn new(controller: Controller<P>) -> Self {
        Self { controller }
    }

    /// Run the add command.
    pub fn run(&mut self, content: &str, options: &AddOptions) -> AddOutput {
        let now = Utc::now();
        let mut draft = InsightDraft::new(content).with_tags(options.tags.clone());
        if let Some(note) = &options.note {
            draft = draft.with_note(note.clone());
        }
        if let Some(source) = &options.source {
            draft = draft.with_source(source.clone());
        }

        match self.controller.add(draft, now) {
            Ok(insight) => AddOutput::success(InsightInfo::from_insight(insight, now)),
            Err(e) => AddOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &AddOutput, options: &AddOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        match (&output.insight, &output.error) {
            (Some(insight), _) => format!(
                "Added insight {}\nFirst review: {}\n",
                insight.id, insight.next_review
            ),
            (None, error) => format!(
                "Add failed: {}\n",
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryAdapter;
    use std::sync::Arc;

    #[test]
    fn test_add_with_metadata() {
        let adapter = Arc::new(MemoryAdapter::new());
        let mut cmd = AddCommand::new(Controller::new(Arc::clone(&adapter), "local"));
        let options = AddOptions {
            note: Some("from the morning walk".to_string()),
            source: Some("Deep Work".to_string()),
            tags: vec!["focus".to_string()],
            ..Default::default()
        };

        let output = cmd.run("Attention is the scarce resource.", &options);

        assert!(output.success);
        let insight = output.insight.as_ref().unwrap();
        assert_eq!(insight.stage, 0);
        assert_eq!(insight.source.as_deref(), Some("Deep Work"));
        assert!(!insight.due);

        let reloaded = Controller::load(adapter, "local");
        assert_eq!(reloaded.insights().len(), 1);
        assert_eq!(reloaded.insights()[0].tags, vec!["focus"]);
    }

    #[test]
    fn test_add_too_short_fails() {
        let mut cmd = AddCommand::new(Controller::new(MemoryAdapter::new(), "local"));
        let options = AddOptions::default();

        let output = cmd.run("short", &options);

        assert!(!output.success);
        assert!(output.insight.is_none());
        assert!(cmd.format_output(&output, &options).starts_with("Add failed"));
    }

    #[test]
    fn test_format_output() {
        let mut cmd = AddCommand::new(Controller::new(MemoryAdapter::new(), "local"));
        let output = cmd.run("Consistency beats intensity.", &AddOptions::default());

        let text = cmd.format_output(&output, &AddOptions::default());
        assert!(text.starts_with("Added insight"));
        assert!(text.contains("First review:"));

        let json = cmd.format_output(
            &output,
            &AddOptions {
                json: true,
                ..Default::default()
            },
        );
        assert!(json.contains("\"success\": true"));
    }
}
