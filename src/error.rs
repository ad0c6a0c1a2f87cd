//! Unified error types for Sprout with fail-open persistence.
//!
//! Nothing in Sprout is fatal to the process. Persistence problems are
//! logged and the in-memory state is kept; only user-facing validation
//! (bad drafts, malformed imports, unknown IDs) is surfaced as an error.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Sprout operations.
#[derive(Error, Debug)]
pub enum SproutError {
    /// I/O errors from data or config file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Persistence adapter errors (bad scope/key, poisoned store).
    #[error("persistence error: {message}")]
    Persistence { message: String },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Scheduling state violations (e.g. reviewing a mastered insight).
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// No insight with the given ID in the collection.
    #[error("insight not found: {id}")]
    InsightNotFound { id: String },

    /// Rejected user input (draft too short, empty patch field).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Import file did not have the expected shape.
    #[error("import error: {message}")]
    Import { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },
}

/// A specialized Result type for Sprout operations.
pub type Result<T> = std::result::Result<T, SproutError>;

impl SproutError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an insight not found error.
    pub fn insight_not_found(id: impl Into<String>) -> Self {
        Self::InsightNotFound { id: id.into() }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an import error.
    pub fn import(message: impl Into<String>) -> Self {
        Self::Import {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<io::Error> for SproutError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SproutError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Log the error and return a safe default.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }
}

/// Exit codes for the Sprout CLI.
pub mod exit_codes {
    /// Command completed.
    pub const OK: i32 = 0;

    /// Command ran but reported a failure (validation, not found, refused).
    pub const ERROR: i32 = 1;

    /// Process panicked.
    pub const CRASH: i32 = 3;
}
