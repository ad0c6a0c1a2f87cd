//! File-based persistence adapter for Sprout.
//!
//! Values are stored as JSON files at `<data_dir>/<scope>/<key>.json`.
//! Atomic writes are achieved via temp file + rename pattern.
//! Subscribers are notified in-process after each successful write; other
//! processes writing the same file are not observed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SproutError};
use crate::storage::subscribers::SubscriberRegistry;
use crate::storage::traits::{validate_name, ChangeCallback, PersistenceAdapter, Subscription};
use crate::util::{read_to_string_limited, write_atomic};

/// File-based key-value store.
pub struct FileAdapter {
    /// Root directory; one subdirectory per scope.
    data_dir: PathBuf,
    subscribers: Arc<SubscriberRegistry>,
}

impl FileAdapter {
    /// Create an adapter rooted at `data_dir`, creating it if needed.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();

        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir).map_err(|e| SproutError::storage(&data_dir, e))?;
        }

        Ok(Self {
            data_dir,
            subscribers: SubscriberRegistry::new(),
        })
    }

    /// Root data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file backing `scope`/`key`.
    pub fn value_path(&self, scope: &str, key: &str) -> Result<PathBuf> {
        validate_name("scope", scope)?;
        validate_name("key", key)?;
        Ok(self.data_dir.join(scope).join(format!("{}.json", key)))
    }
}

impl PersistenceAdapter for FileAdapter {
    fn get(&self, scope: &str, key: &str) -> Result<Option<Value>> {
        let path = self.value_path(scope, key)?;

        if !path.exists() {
            return Ok(None);
        }

        let content = read_to_string_limited(&path)?;
        let value: Value = serde_json::from_str(&content)?;

        Ok(Some(value))
    }

    fn set(&self, scope: &str, key: &str, value: &Value) -> Result<()> {
        let path = self.value_path(scope, key)?;

        let json = serde_json::to_string_pretty(value)?;
        write_atomic(&path, json.as_bytes())?;
        debug!("Wrote {} ({} bytes)", path.display(), json.len());

        self.subscribers.notify(scope, key, value);
        Ok(())
    }

    fn subscribe(
        &self,
        scope: &str,
        key: &str,
        on_change: ChangeCallback,
    ) -> Result<Subscription> {
        validate_name("scope", scope)?;
        validate_name("key", key)?;
        Ok(self.subscribers.subscribe(scope, key, on_change))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
