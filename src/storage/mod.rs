//! Persistence adapters for Sprout.
//!
//! The whole insight collection lives under one key per user scope.
//! Adapters are file-based or in-memory; both support change
//! subscriptions.

pub mod file;
pub mod memory;
pub mod subscribers;
pub mod traits;

pub use file::FileAdapter;
pub use memory::MemoryAdapter;
pub use subscribers::SubscriberRegistry;
pub use traits::{validate_name, ChangeCallback, PersistenceAdapter, Subscription};

use crate::config::{Backend, StorageConfig};
use crate::error::Result;

/// Key under which the insight collection is stored.
pub const INSIGHTS_KEY: &str = "insights";

/// Open the adapter selected in configuration.
pub fn open_adapter(config: &StorageConfig) -> Result<Box<dyn PersistenceAdapter>> {
    match config.backend {
        Backend::File => Ok(Box::new(FileAdapter::new(config.resolved_data_dir()?)?)),
        Backend::Memory => Ok(Box::new(MemoryAdapter::new())),
    }
}
