//! Export command for Sprout.
//!
//! Writes the collection as a JSON array, to a file or to stdout.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::Controller;
use crate::storage::PersistenceAdapter;
use crate::util::write_atomic;

/// Options for the export command.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// File to write; stdout when absent.
    pub output: Option<PathBuf>,
}

/// Output format for the export command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOutput {
    pub success: bool,
    /// Number of insights exported.
    pub count: usize,
    /// File written, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// The exported collection, when not written to a file.
    #[serde(skip)]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            count: 0,
            path: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// The export command implementation.
pub struct ExportCommand<P: PersistenceAdapter> {
    controller: Controller<P>,
}

impl<P: PersistenceAdapter> ExportCommand<P> {
    /// Create a new export command.
    pub fn new(controller: Controller<P>) -> Self {
        Self { controller }
    }

    /// Run the export command.
    pub fn run(&self, options: &ExportOptions) -> ExportOutput {
        let data = match self.controller.export() {
            Ok(data) => data,
            Err(e) => return ExportOutput::failure(e.to_string()),
        };
        let count = self.controller.insights().len();

        match &options.output {
            Some(path) => match write_atomic(path, data.as_bytes()) {
                Ok(()) => ExportOutput {
                    success: true,
                    count,
                    path: Some(path.clone()),
                    data: None,
                    error: None,
                },
                Err(e) => ExportOutput::failure(e.to_string()),
            },
            None => ExportOutput {
                success: true,
                count,
                path: None,
                data: Some(data),
                error: None,
            },
        }
    }

    /// Format output based on options.
    ///
    /// Without an output file the collection itself is the output, in both
    /// text and JSON mode.
    pub fn format_output(&self, output: &ExportOutput, options: &ExportOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if let Some(data) = &output.data {
            return data.clone();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        match &output.path {
            Some(path) => format!(
                "Exported {} insight(s) to {}\n",
                output.count,
                path.display()
            ),
            None => format!(
                "Export failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InsightDraft;
    use crate::storage::MemoryAdapter;
    use crate::transfer::parse_collection;
    use chrono::Utc;
    use tempfile::TempDir;

    fn setup() -> ExportCommand<MemoryAdapter> {
        let mut controller = Controller::new(MemoryAdapter::new(), "local");
        controller
            .add(InsightDraft::new("Exported insight text."), Utc::now())
            .unwrap();
        ExportCommand::new(controller)
    }

    #[test]
    fn test_export_to_stdout() {
        let cmd = setup();
        let options = ExportOptions::default();

        let output = cmd.run(&options);
        let printed = cmd.format_output(&output, &options);

        assert!(output.success);
        let parsed = parse_collection(&printed, Utc::now()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].content, "Exported insight text.");
    }

    #[test]
    fn test_export_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup").join("sprout.json");
        let cmd = setup();
        let options = ExportOptions {
            output: Some(path.clone()),
            ..Default::default()
        };

        let output = cmd.run(&options);

        assert!(output.success);
        assert_eq!(output.count, 1);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_collection(&written, Utc::now()).unwrap().len(), 1);
        assert!(cmd
            .format_output(&output, &options)
            .starts_with("Exported 1 insight(s) to"));

        let json = cmd.format_output(
            &output,
            &ExportOptions {
                json: true,
                ..options
            },
        );
        assert!(json.contains("\"count\": 1"));
    }
}
