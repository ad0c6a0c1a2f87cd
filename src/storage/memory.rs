//! In-memory persistence adapter.
//!
//! Thread-safe and process-local. Used for tests, for `backend = "memory"`,
//! and as a stand-in for a remote store when exercising sync.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::{Result, SproutError};
use crate::storage::subscribers::SubscriberRegistry;
use crate::storage::traits::{validate_name, ChangeCallback, PersistenceAdapter, Subscription};

/// In-memory key-value store.
///
/// Values are lost when the adapter is dropped.
#[derive(Default)]
pub struct MemoryAdapter {
    values: RwLock<HashMap<(String, String), Value>>,
    subscribers: Arc<SubscriberRegistry>,
}

impl MemoryAdapter {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions for `scope`/`key`.
    pub fn subscriber_count(&self, scope: &str, key: &str) -> usize {
        self.subscribers.count(scope, key)
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn get(&self, scope: &str, key: &str) -> Result<Option<Value>> {
        validate_name("scope", scope)?;
        validate_name("key", key)?;

        let values = self
            .values
            .read()
            .map_err(|_| SproutError::persistence("memory store lock poisoned"))?;
        Ok(values.get(&(scope.to_string(), key.to_string())).cloned())
    }

    fn set(&self, scope: &str, key: &str, value: &Value) -> Result<()> {
        validate_name("scope", scope)?;
        validate_name("key", key)?;

        {
            let mut values = self
                .values
                .write()
                .map_err(|_| SproutError::persistence("memory store lock poisoned"))?;
            values.insert((scope.to_string(), key.to_string()), value.clone());
        }

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
        "memory"
    }
}
