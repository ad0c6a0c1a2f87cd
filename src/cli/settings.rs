//! Settings command for Sprout.
//!
//! Shows the effective configuration and saves changes to the user config
//! file. Environment overrides still apply on top of the saved values.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{Config, GeneratorKind, StorageConfig};
use crate::error::{Result, SproutError};

/// Options for the settings command.
#[derive(Debug, Clone, Default)]
pub struct SettingsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// New exercise generator.
    pub generator: Option<GeneratorKind>,
    /// New user scope.
    pub scope: Option<String>,
}

impl SettingsOptions {
    fn has_changes(&self) -> bool {
        self.generator.is_some() || self.scope.is_some()
    }
}

/// One changed setting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettingChange {
    pub key: String,
    pub old: String,
    pub new: String,
}

/// Output format for the settings command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsOutput {
    pub success: bool,
    /// Effective configuration after any changes.
    pub config: Config,
    /// User config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    /// Changes written to the user config file.
    pub changes: Vec<SettingChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SettingsOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            config: Config::default(),
            config_path: None,
            changes: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The settings command implementation.
pub struct SettingsCommand {
    home: Option<PathBuf>,
}

impl SettingsCommand {
    /// Create a settings command for the given Sprout home directory.
    pub fn new(home: Option<PathBuf>) -> Self {
        Self { home }
    }

    /// Run the settings command.
    pub fn run(&self, options: &SettingsOptions) -> SettingsOutput {
        match self.apply(options) {
            Ok(output) => output,
            Err(e) => SettingsOutput::failure(e.to_string()),
        }
    }

    fn apply(&self, options: &SettingsOptions) -> Result<SettingsOutput> {
        let home = self
            .home
            .as_deref()
            .ok_or_else(|| SproutError::config("could not determine Sprout home directory"))?;

        let mut changes = Vec::new();
        if options.has_changes() {
            if let Some(scope) = &options.scope {
                if !StorageConfig::is_valid_scope(scope) {
                    return Err(SproutError::validation(format!(
                        "invalid scope '{}': must be non-empty with no path separators",
                        scope
                    )));
                }
            }

            // Edit the user file only, so env overrides are not baked in
            let before = Config::load_user_config(home).unwrap_or_default();
            let mut after = before.clone();
            if let Some(generator) = options.generator {
                after.exercises.generator = generator;
            }
            if let Some(scope) = &options.scope {
                after.storage.scope = scope.clone();
            }

            changes = before
                .diff(&after)
                .into_iter()
                .map(|(key, old, new)| SettingChange { key, old, new })
                .collect();
            if !changes.is_empty() {
                let path = after.save_to(home)?;
                tracing::info!("Saved {} setting change(s) to {}", changes.len(), path.display());
            }
        }

        Ok(SettingsOutput {
            success: true,
            config: Config::load_from_home(Some(home)),
            config_path: Some(home.join("config.toml")),
            changes,
            error: None,
        })
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &SettingsOutput, options: &SettingsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "Settings failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut lines = Vec::new();
        for change in &output.changes {
            lines.push(format!("Set {}: {} -> {}", change.key, change.old, change.new));
        }
        if options.has_changes() && output.changes.is_empty() {
            lines.push("No changes.".to_string());
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }

        let config = &output.config;
        lines.push("Settings".to_string());
        lines.push("========".to_string());
        lines.push(format!("storage.backend:               {}", config.storage.backend));
        lines.push(format!(
            "storage.data_dir:              {}",
            config
                .storage
                .resolved_data_dir()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|_| "(unknown)".to_string())
        ));
        lines.push(format!("storage.scope:                 {}", config.storage.scope));
        lines.push(format!(
            "exercises.generator:           {}",
            config.exercises.generator
        ));
        lines.push(format!(
            "exercises.simulated_latency_ms: {}",
            config.exercises.simulated_latency_ms
        ));
        if let Some(path) = &output.config_path {
            lines.push(String::new());
            lines.push(format!("Config file: {}", path.display()));
        }

        lines.push(String::new());
        lines.join("\n")
    }
}
