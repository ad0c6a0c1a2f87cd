//! Sprout - spaced-repetition notebook for short insights
//!
//! Sprout captures short insights, schedules them for review on a fixed
//! interval ladder, and generates practice exercises from their text.
//! The collection is persisted through a pluggable key-value adapter.

pub mod cli;
pub mod config;
pub mod core;
pub mod dashboard;
pub mod error;
pub mod exercises;
pub mod scheduler;
pub mod storage;
pub mod transfer;
pub mod util;

pub use config::Config;
pub use core::{Controller, Insight, InsightDraft, InsightPatch, View};
pub use dashboard::DashboardSummary;
pub use error::{Result, SproutError};
pub use exercises::{generator_for, Exercise, ExerciseGenerator};
pub use scheduler::ReviewOutcome;
pub use storage::{FileAdapter, MemoryAdapter, PersistenceAdapter};

// CLI commands
pub use cli::{
    AddCommand, ClearCommand, DashboardCommand, DeleteCommand, EditCommand, ExportCommand,
    ImportCommand, ListCommand, PracticeCommand, ReviewCommand, SettingsCommand,
};
