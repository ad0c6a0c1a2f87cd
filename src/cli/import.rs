//! Import command for Sprout.
//!
//! Replaces the whole collection with the insights in a JSON export file.
//! The file is validated first; without `--yes` nothing is replaced.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::Controller;
use crate::error::Result;
use crate::storage::PersistenceAdapter;
use crate::transfer;
use crate::util::read_to_string_limited;

/// Options for the import command.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Confirm replacing the collection.
    pub yes: bool,
}

/// Output format for the import command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutput {
    pub success: bool,
    /// Insights in the file.
    pub found: usize,
    /// Insights that were in the collection before.
    pub replaced: usize,
    /// Whether the collection was replaced.
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            found: 0,
            replaced: 0,
            applied: false,
            error: Some(error.into()),
        }
    }
}

/// The import command implementation.
pub struct ImportCommand<P: PersistenceAdapter> {
    controller: Controller<P>,
}

impl<P: PersistenceAdapter> ImportCommand<P> {
    /// Create a new import command.
    pub fn new(controller: Controller<P>) -> Self {
        Self { controller }
    }

    /// Run the import command.
    pub fn run(&mut self, path: &Path, options: &ImportOptions) -> ImportOutput {
        match self.import(path, options) {
            Ok(output) => output,
            Err(e) => ImportOutput::failure(e.to_string()),
        }
    }

    fn import(&mut self, path: &Path, options: &ImportOptions) -> Result<ImportOutput> {
        let text = read_to_string_limited(path)?;
        let insights = transfer::parse_collection(&text, Utc::now())?;
        let found = insights.len();
        let existing = self.controller.insights().len();

        if !options.yes && existing > 0 {
            return Ok(ImportOutput {
                success: false,
                found,
                replaced: 0,
                applied: false,
                error: Some(format!(
                    "importing replaces all {} existing insight(s); rerun with --yes to confirm",
                    existing
                )),
            });
        }

        self.controller.import(insights)?;
        Ok(ImportOutput {
            success: true,
            found,
            replaced: existing,
            applied: true,
            error: None,
        })
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ImportOutput, options: &ImportOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if output.applied {
            format!(
                "Imported {} insight(s), replacing {}.\n",
                output.found, output.replaced
            )
        } else {
            format!(
                "Import failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}
