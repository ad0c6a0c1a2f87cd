//! Clear command for Sprout.
//!
//! Empties the whole collection. Refuses to run without `--yes`.

use serde::{Deserialize, Serialize};

use crate::core::Controller;
use crate::storage::PersistenceAdapter;

/// Options for the clear command.
#[derive(Debug, Clone, Default)]
pub struct ClearOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Confirm removing everything.
    pub yes: bool,
}

/// Output format for the clear command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearOutput {
    pub success: bool,
    /// Number of insights removed.
    pub removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The clear command implementation.
pub struct ClearCommand<P: PersistenceAdapter> {
    controller: Controller<P>,
}

impl<P: PersistenceAdapter> ClearCommand<P> {
    /// Create a new clear command.
    pub fn new(controller: Controller<P>) -> Self {
        Self { controller }
    }

    /// Run the clear command.
    pub fn run(&mut self, options: &ClearOptions) -> ClearOutput {
        let count = self.controller.insights().len();
        if !options.yes && count > 0 {
            return ClearOutput {
                success: false,
                removed: 0,
                error: Some(format!(
                    "this removes all {} insight(s) permanently; rerun with --yes to confirm",
                    count
                )),
            };
        }

        ClearOutput {
            success: true,
            removed: self.controller.clear(),
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ClearOutput, options: &ClearOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if output.success {
            format!("Removed {} insight(s).\n", output.removed)
        } else {
            format!(
                "Clear failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InsightDraft;
    use crate::storage::MemoryAdapter;
    use chrono::Utc;

    fn setup() -> ClearCommand<MemoryAdapter> {
        let mut controller = Controller::new(MemoryAdapter::new(), "local");
        for content in ["First of two insights.", "Second of two insights."] {
            controller.add(InsightDraft::new(content), Utc::now()).unwrap();
        }
        ClearCommand::new(controller)
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let mut cmd = setup();
        let options = ClearOptions::default();

        let output = cmd.run(&options);

        assert!(!output.success);
        assert!(cmd.format_output(&output, &options).contains("--yes"));
    }

    #[test]
    fn test_clear_confirmed() {
        let mut cmd = setup();
        let options = ClearOptions {
            yes: true,
            ..Default::default()
        };

        let output = cmd.run(&options);

        assert!(output.success);
        assert_eq!(output.removed, 2);
        assert_eq!(cmd.format_output(&output, &options), "Removed 2 insight(s).\n");
    }

    #[test]
    fn test_clear_empty_needs_no_confirmation() {
        let mut cmd = ClearCommand::new(Controller::new(MemoryAdapter::new(), "local"));

        let output = cmd.run(&ClearOptions::default());

        assert!(output.success);
        assert_eq!(output.removed, 0);
    }
}
