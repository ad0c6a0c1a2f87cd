//! Configuration loading for Sprout.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. User config (`~/.sprout/config.toml`)
//! 3. Defaults (lowest priority)
//!
//! All configuration is optional. The system runs with sensible defaults
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, SproutError};
use crate::storage::validate_name;
use crate::util::{read_to_string_limited, write_atomic};

/// Main configuration struct for Sprout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Persistence configuration.
    pub storage: StorageConfig,
    /// Exercise generation configuration.
    pub exercises: ExercisesConfig,
}

/// Which persistence adapter to use.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// JSON files under the data directory.
    #[default]
    File,
    /// Process-local memory; nothing survives the process.
    Memory,
}

/// Valid values for the storage backend field.
pub const VALID_BACKENDS: &[&str] = &["file", "memory"];

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::File => "file",
            Backend::Memory => "memory",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "file" => Ok(Backend::File),
            "memory" => Ok(Backend::Memory),
            other => Err(SproutError::config(format!(
                "invalid backend '{}', valid values: {:?}",
                other, VALID_BACKENDS
            ))),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Adapter to use.
    pub backend: Backend,
    /// Data directory for the file backend. Defaults to `<home>/data`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Per-user scope the collection is stored under.
    pub scope: String,
}

/// Default user scope.
pub const DEFAULT_SCOPE: &str = "local";

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::File,
            data_dir: None,
            scope: DEFAULT_SCOPE.to_string(),
        }
    }
}

impl StorageConfig {
    /// The data directory to use, falling back to `<home>/data`.
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => sprout_home()
                .map(|home| home.join("data"))
                .ok_or_else(|| SproutError::config("could not determine data directory")),
        }
    }

    /// Check if a scope value is valid.
    pub fn is_valid_scope(value: &str) -> bool {
        validate_name("scope", value).is_ok()
    }
}

/// Which exercise generation strategy to use.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Random selection among qualifying words.
    #[default]
    Basic,
    /// Importance scoring and concept extraction.
    Enhanced,
}

/// Valid values for the exercise generator field.
pub const VALID_GENERATORS: &[&str] = &["basic", "enhanced"];

impl GeneratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::Basic => "basic",
            GeneratorKind::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratorKind {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(GeneratorKind::Basic),
            "enhanced" => Ok(GeneratorKind::Enhanced),
            other => Err(SproutError::config(format!(
                "invalid generator '{}', valid values: {:?}",
                other, VALID_GENERATORS
            ))),
        }
    }
}

/// Exercise generation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExercisesConfig {
    /// Generation strategy.
    pub generator: GeneratorKind,
    /// Artificial delay for the enhanced generator, in milliseconds.
    pub simulated_latency_ms: u64,
}

/// Upper bound for `simulated_latency_ms`.
pub const MAX_LATENCY_MS: u64 = 10_000;

impl ExercisesConfig {
    /// Check if a latency value is valid.
    pub fn is_valid_latency(value: u64) -> bool {
        value <= MAX_LATENCY_MS
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. User config (`~/.sprout/config.toml`)
    /// 3. Defaults
    pub fn load() -> Self {
        Self::load_from_home(sprout_home().as_deref())
    }

    /// Load configuration using a specific home directory.
    pub fn load_from_home(home: Option<&Path>) -> Self {
        let mut config = Config::default();

        // Layer 3 → 2: Apply user config
        if let Some(user_config) = home.and_then(Self::load_user_config) {
            config = config.merge(user_config);
        }

        // Layer 2 → 1: Apply environment variables
        config.apply_env_overrides();

        config
    }

    /// Load only the user config from `<home>/config.toml`, without
    /// environment overrides. `None` if the file is absent or unreadable.
    pub fn load_user_config(home: &Path) -> Option<Config> {
        let config_path = home.join("config.toml");
        if !config_path.exists() {
            return None;
        }
        match Self::load_from_file(&config_path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!(
                    "Warning: Ignoring {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                None
            }
        }
    }

    /// Load config from a specific file path.
    fn load_from_file(path: &Path) -> Result<Config> {
        let content = read_to_string_limited(path)?;
        toml::from_str(&content).map_err(|e| SproutError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // SPROUT_BACKEND
        if let Ok(val) = env::var("SPROUT_BACKEND") {
            match val.parse::<Backend>() {
                Ok(backend) => self.storage.backend = backend,
                Err(_) => eprintln!(
                    "Warning: Invalid SPROUT_BACKEND value '{}'. \
                    Valid values: {:?}. Using '{}'.",
                    val, VALID_BACKENDS, self.storage.backend
                ),
            }
        }

        // SPROUT_DATA_DIR
        if let Ok(val) = env::var("SPROUT_DATA_DIR") {
            if val.is_empty() {
                eprintln!("Warning: SPROUT_DATA_DIR is empty. Ignoring.");
            } else {
                self.storage.data_dir = Some(PathBuf::from(val));
            }
        }

        // SPROUT_SCOPE
        if let Ok(val) = env::var("SPROUT_SCOPE") {
            if StorageConfig::is_valid_scope(&val) {
                self.storage.scope = val;
            } else {
                eprintln!(
                    "Warning: Invalid SPROUT_SCOPE value '{}'. \
                    Must be non-empty with no path separators. Using '{}'.",
                    val, self.storage.scope
                );
            }
        }

        // SPROUT_GENERATOR
        if let Ok(val) = env::var("SPROUT_GENERATOR") {
            match val.parse::<GeneratorKind>() {
                Ok(kind) => self.exercises.generator = kind,
                Err(_) => eprintln!(
                    "Warning: Invalid SPROUT_GENERATOR value '{}'. \
                    Valid values: {:?}. Using '{}'.",
                    val, VALID_GENERATORS, self.exercises.generator
                ),
            }
        }

        // SPROUT_LATENCY_MS
        if let Ok(val) = env::var("SPROUT_LATENCY_MS") {
            match val.parse::<u64>() {
                Ok(n) if ExercisesConfig::is_valid_latency(n) => {
                    self.exercises.simulated_latency_ms = n;
                }
                _ => eprintln!(
                    "Warning: Invalid SPROUT_LATENCY_MS value '{}'. \
                    Expected an integer in [0, {}]. Using '{}'.",
                    val, MAX_LATENCY_MS, self.exercises.simulated_latency_ms
                ),
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence. All non-default fields from
    /// `other` are applied to `self`, field by field.
    ///
    /// # Limitation
    ///
    /// A layer cannot set a value back to its default to override a
    /// non-default value from a lower layer, since "not set" and "set to
    /// the default" look the same after deserialization.
    fn merge(mut self, other: Config) -> Self {
        let default_storage = StorageConfig::default();
        if other.storage.backend != default_storage.backend {
            self.storage.backend = other.storage.backend;
        }
        if other.storage.data_dir.is_some() {
            self.storage.data_dir = other.storage.data_dir;
        }
        if other.storage.scope != default_storage.scope {
            if StorageConfig::is_valid_scope(&other.storage.scope) {
                self.storage.scope = other.storage.scope;
            } else {
                eprintln!(
                    "Warning: Invalid storage.scope '{}' in config. Using '{}'.",
                    other.storage.scope, self.storage.scope
                );
            }
        }

        let default_exercises = ExercisesConfig::default();
        if other.exercises.generator != default_exercises.generator {
            self.exercises.generator = other.exercises.generator;
        }
        if other.exercises.simulated_latency_ms != default_exercises.simulated_latency_ms {
            self.exercises.simulated_latency_ms =
                other.exercises.simulated_latency_ms.min(MAX_LATENCY_MS);
        }

        self
    }

    /// Save configuration as `config.toml` in the given directory.
    pub fn save_to(&self, home: &Path) -> Result<PathBuf> {
        let config_path = home.join("config.toml");
        let content =
            toml::to_string_pretty(self).map_err(|e| SproutError::config(e.to_string()))?;
        write_atomic(&config_path, content.as_bytes())?;
        Ok(config_path)
    }

    /// Generate a diff of changed values between two configs.
    ///
    /// Returns a list of (key, old_value, new_value) tuples for changed fields.
    pub fn diff(&self, other: &Config) -> Vec<(String, String, String)> {
        let mut changes = Vec::new();

        if self.storage.backend != other.storage.backend {
            changes.push((
                "storage.backend".to_string(),
                self.storage.backend.to_string(),
                other.storage.backend.to_string(),
            ));
        }

        if self.storage.data_dir != other.storage.data_dir {
            let show = |d: &Option<PathBuf>| {
                d.as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(default)".to_string())
            };
            changes.push((
                "storage.data_dir".to_string(),
                show(&self.storage.data_dir),
                show(&other.storage.data_dir),
            ));
        }

        if self.storage.scope != other.storage.scope {
            changes.push((
                "storage.scope".to_string(),
                self.storage.scope.clone(),
                other.storage.scope.clone(),
            ));
        }

        if self.exercises.generator != other.exercises.generator {
            changes.push((
                "exercises.generator".to_string(),
                self.exercises.generator.to_string(),
                other.exercises.generator.to_string(),
            ));
        }

        if self.exercises.simulated_latency_ms != other.exercises.simulated_latency_ms {
            changes.push((
                "exercises.simulated_latency_ms".to_string(),
                self.exercises.simulated_latency_ms.to_string(),
                other.exercises.simulated_latency_ms.to_string(),
            ));
        }

        changes
    }
}

/// Get the Sprout home directory.
///
/// Checks `SPROUT_HOME` environment variable first, then falls back to
/// `~/.sprout`. An empty `SPROUT_HOME` is ignored.
pub fn sprout_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("SPROUT_HOME") {
        if home.is_empty() {
            tracing::warn!("SPROUT_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("SPROUT_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".sprout"));
    }

    // Containerized/minimal environments without HOME
    let fallback_path = fallback_sprout_home();
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

/// Get fallback home path when HOME is unavailable.
#[cfg(unix)]
fn fallback_sprout_home() -> PathBuf {
    use std::os::unix::fs::MetadataExt;
    let uid = std::fs::metadata("/").map(|m| m.uid()).unwrap_or(0);
    PathBuf::from(format!("/tmp/sprout-{}", uid))
}

/// Get fallback home path when HOME is unavailable.
#[cfg(not(unix))]
fn fallback_sprout_home() -> PathBuf {
    std::env::temp_dir().join("sprout")
}

/// Path of the crash log written by the panic hook.
pub fn crash_log_path() -> Option<PathBuf> {
    sprout_home().map(|h| h.join("crash.log"))
}
