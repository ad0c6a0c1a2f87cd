//! CLI commands for Sprout.
//!
//! Each command has `Options`, a serializable `Output`, `run`, and
//! `format_output`. They are organized into:
//! - **View commands**: dashboard, list, review, practice, settings
//! - **Collection commands**: add, edit, delete, clear
//! - **Transfer commands**: import, export

// View commands
pub mod dashboard_cmd;
pub mod list;
pub mod practice;
pub mod review;
pub mod settings;

// Collection commands
pub mod add;
pub mod clear;
pub mod delete;
pub mod edit;

// Transfer commands
pub mod export;
pub mod import;

pub use add::AddCommand;
pub use clear::ClearCommand;
pub use dashboard_cmd::DashboardCommand;
pub use delete::DeleteCommand;
pub use edit::EditCommand;
pub use export::ExportCommand;
pub use import::ImportCommand;
pub use list::{InsightInfo, ListCommand};
pub use practice::PracticeCommand;
pub use review::ReviewCommand;
pub use settings::SettingsCommand;
