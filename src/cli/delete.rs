//! Delete command for Sprout.
//!
//! Removes one insight permanently. Refuses to run without `--yes`.

use serde::{Deserialize, Serialize};

use crate::core::Controller;
use crate::storage::PersistenceAdapter;
use crate::util::truncate_chars;

/// Options for the delete command.
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Confirm the deletion.
    pub yes: bool,
}

/// Output format for the delete command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOutput {
    pub success: bool,
    /// ID of the deleted insight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<String>,
    /// Content of the deleted insight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            deleted: None,
            content: None,
            error: Some(error.into()),
        }
    }
}

/// The delete command implementation.
pub struct DeleteCommand<P: PersistenceAdapter> {
    controller: Controller<P>,
}

impl<P: PersistenceAdapter> DeleteCommand<P> {
    /// Create a new delete command.
    pub fn new(controller: Controller<P>) -> Self {
        Self { controller }
    }

    /// Run the delete command.
    pub fn run(&mut self, id: &str, options: &DeleteOptions) -> DeleteOutput {
        if self.controller.get(id).is_none() {
            return DeleteOutput::failure(format!("insight not found: {}", id));
        }
        if !options.yes {
            return DeleteOutput::failure(format!(
                "deleting {} cannot be undone; rerun with --yes to confirm",
                id
            ));
        }

        match self.controller.delete(id) {
            Ok(removed) => DeleteOutput {
                success: true,
                deleted: Some(removed.id),
                content: Some(removed.content),
                error: None,
            },
            Err(e) => DeleteOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &DeleteOutput, options: &DeleteOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        match (&output.deleted, &output.content) {
            (Some(id), Some(content)) => {
                format!("Deleted {}: {}\n", id, truncate_chars(content, 60))
            }
            _ => format!(
                "Delete failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}
