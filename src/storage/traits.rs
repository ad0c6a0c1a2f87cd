//! Persistence adapter trait for Sprout.
//!
//! An adapter is a key-value store of JSON values, partitioned by an opaque
//! per-user scope. Writers to the same scope and key are last-write-wins;
//! there is no merge or conflict detection.

use std::sync::{Arc, Weak};

use serde_json::Value;

use crate::error::{Result, SproutError};
use crate::storage::subscribers::SubscriberRegistry;

/// Callback invoked with the new value after a write to a watched key.
pub type ChangeCallback = Box<dyn Fn(&Value) + Send + Sync>;

/// Trait for persistence backends.
///
/// Implementations must be thread-safe. `subscribe` delivers a
/// notification for every successful `set` on the same scope and key,
/// after the value has been stored.
pub trait PersistenceAdapter: Send + Sync {
    /// Read a value.
    ///
    /// Returns `Ok(None)` if nothing has been stored under the key.
    fn get(&self, scope: &str, key: &str) -> Result<Option<Value>>;

    /// Store a value, replacing whatever was there.
    fn set(&self, scope: &str, key: &str, value: &Value) -> Result<()>;

    /// Watch a key for changes until the returned subscription is dropped
    /// or unsubscribed.
    fn subscribe(&self, scope: &str, key: &str, on_change: ChangeCallback)
        -> Result<Subscription>;

    /// Adapter name for logging and settings output.
    fn name(&self) -> &'static str;
}

/// Blanket implementation of PersistenceAdapter for Arc-wrapped adapters.
///
/// Lets a controller and a test (or two controllers) share one store.
impl<T: PersistenceAdapter + ?Sized> PersistenceAdapter for Arc<T> {
    fn get(&self, scope: &str, key: &str) -> Result<Option<Value>> {
        (**self).get(scope, key)
    }

    fn set(&self, scope: &str, key: &str, value: &Value) -> Result<()> {
        (**self).set(scope, key, value)
    }

    fn subscribe(
        &self,
        scope: &str,
        key: &str,
        on_change: ChangeCallback,
    ) -> Result<Subscription> {
        (**self).subscribe(scope, key, on_change)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<T: PersistenceAdapter + ?Sized> PersistenceAdapter for Box<T> {
    fn get(&self, scope: &str, key: &str) -> Result<Option<Value>> {
        (**self).get(scope, key)
    }

    fn set(&self, scope: &str, key: &str, value: &Value) -> Result<()> {
        (**self).set(scope, key, value)
    }

    fn subscribe(
        &self,
        scope: &str,
        key: &str,
        on_change: ChangeCallback,
    ) -> Result<Subscription> {
        (**self).subscribe(scope, key, on_change)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// An active change subscription.
///
/// Dropping the subscription unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Weak<SubscriberRegistry>,
    slot: (String, String),
    id: u64,
}

impl Subscription {
    pub(crate) fn new(
        registry: Weak<SubscriberRegistry>,
        slot: (String, String),
        id: u64,
    ) -> Self {
        Self { registry, slot, id }
    }

    /// Scope this subscription watches.
    pub fn scope(&self) -> &str {
        &self.slot.0
    }

    /// Key this subscription watches.
    pub fn key(&self) -> &str {
        &self.slot.1
    }

    /// Stop receiving notifications.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.slot, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("scope", &self.slot.0)
            .field("key", &self.slot.1)
            .field("id", &self.id)
            .finish()
    }
}

/// Check that a scope or key is usable as a single path component.
///
/// Rejects empty names, path separators, `..` and leading dots.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name.contains("..");
    if invalid {
        return Err(SproutError::persistence(format!(
            "invalid {} '{}': must be non-empty and contain no path separators",
            kind, name
        )));
    }
    Ok(())
}

/// Test utilities for PersistenceAdapter implementations.
#[cfg(test)]
pub mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Contract every adapter must satisfy.
    pub fn test_adapter_contract<A: PersistenceAdapter>(adapter: &A) {
        // Absent until written
        assert!(adapter.get("alice", "insights").unwrap().is_none());

        // Write then read
        adapter.set("alice", "insights", &json!([{"id": "1"}])).unwrap();
        assert_eq!(
            adapter.get("alice", "insights").unwrap(),
            Some(json!([{"id": "1"}]))
        );

        // Last write wins
        adapter.set("alice", "insights", &json!([])).unwrap();
        assert_eq!(adapter.get("alice", "insights").unwrap(), Some(json!([])));

        // Scopes are isolated
        assert!(adapter.get("bob", "insights").unwrap().is_none());

        // Subscribers see writes to their key only
        let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sub = adapter
            .subscribe(
                "alice",
                "insights",
                Box::new(move |v| seen_clone.lock().unwrap().push(v.clone())),
            )
            .unwrap();
        assert_eq!(sub.scope(), "alice");
        assert_eq!(sub.key(), "insights");

        adapter.set("alice", "insights", &json!([1])).unwrap();
        adapter.set("bob", "insights", &json!([2])).unwrap();
        adapter.set("alice", "settings", &json!({})).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![json!([1])]);

        // No more notifications after unsubscribe
        sub.unsubscribe();
        adapter.set("alice", "insights", &json!([3])).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);

        // Bad names are rejected
        assert!(adapter.get("", "insights").is_err());
        assert!(adapter.set("alice", "../escape", &json!(1)).is_err());
        assert!(adapter.subscribe("a/b", "k", Box::new(|_| {})).is_err());
    }

    /// Dropping a subscription stops notifications too.
    pub fn test_drop_unsubscribes<A: PersistenceAdapter>(adapter: &A) {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        {
            let _sub = adapter
                .subscribe(
                    "carol",
                    "insights",
                    Box::new(move |_| {
                        hits_clone.fetch_add(1, Ordering::SeqCst);
                    }),
                )
                .unwrap();
            adapter.set("carol", "insights", &json!(1)).unwrap();
        }
        adapter.set("carol", "insights", &json!(2)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("scope", "local").is_ok());
        assert!(validate_name("scope", "user-123_abc").is_ok());
        assert!(validate_name("scope", "").is_err());
        assert!(validate_name("key", "a/b").is_err());
        assert!(validate_name("key", "a\\b").is_err());
        assert!(validate_name("key", "..").is_err());
        assert!(validate_name("key", ".hidden").is_err());
    }
}
