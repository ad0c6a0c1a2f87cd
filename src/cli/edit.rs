//! Edit command for Sprout.
//!
//! Changes the text or metadata of an existing insight. The review
//! schedule and histories are left alone.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::cli::list::InsightInfo;
use crate::core::{Controller, InsightPatch};
use crate::storage::PersistenceAdapter;

/// Options for the edit command.
#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// New content.
    pub content: Option<String>,
    /// New note; an empty string clears it.
    pub note: Option<String>,
    /// New source; an empty string clears it.
    pub source: Option<String>,
    /// Replacement tags.
    pub tags: Option<Vec<String>>,
}

impl EditOptions {
    fn to_patch(&self) -> InsightPatch {
        InsightPatch {
            content: self.content.clone(),
            note: self.note.clone().map(Some),
            source: self.source.clone().map(Some),
            tags: self.tags.clone(),
            ..Default::default()
        }
    }
}

/// Output format for the edit command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<InsightInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EditOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            insight: None,
            error: Some(error.into()),
        }
    }
}

/// The edit command implementation.
pub struct EditCommand<P: PersistenceAdapter> {
    controller: Controller<P>,
}

impl<P: PersistenceAdapter> EditCommand<P> {
    /// Create a new edit command.
    pub fn new(controller: Controller<P>) -> Self {
        Self { controller }
    }

    /// Run the edit command.
    pub fn run(&mut self, id: &str, options: &EditOptions) -> EditOutput {
        let patch = options.to_patch();
        if patch.is_empty() {
            return EditOutput::failure(
                "nothing to change (use --content, --note, --source or --tag)",
            );
        }

        let now = Utc::now();
        match self.controller.update(id, patch, now) {
            Ok(insight) => EditOutput {
                success: true,
                insight: Some(InsightInfo::from_insight(insight, now)),
                error: None,
            },
            Err(e) => EditOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &EditOutput, options: &EditOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        match &output.insight {
            Some(insight) => format!("Updated {}\n  {}\n", insight.id, insight.content),
            None => format!(
                "Edit failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}
