//! Change-notification registry shared by the persistence adapters.
//!
//! Callbacks are keyed by `(scope, key)`. Notification clones the matching
//! callbacks out of the lock before calling them, so a callback may itself
//! subscribe or unsubscribe without deadlocking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::storage::traits::{ChangeCallback, Subscription};

type Listener = Arc<dyn Fn(&Value) + Send + Sync>;
type Slot = (String, String);

/// Registered change listeners for one adapter.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<Slot, Vec<(u64, Listener)>>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a callback for `scope`/`key`.
    pub fn subscribe(
        self: &Arc<Self>,
        scope: &str,
        key: &str,
        callback: ChangeCallback,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = (scope.to_string(), key.to_string());
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(slot.clone())
            .or_default()
            .push((id, Arc::from(callback)));

        Subscription::new(Arc::downgrade(self), slot, id)
    }

    /// Call every listener of `scope`/`key` with the new value.
    pub fn notify(&self, scope: &str, key: &str, value: &Value) {
        let listeners: Vec<Listener> = {
            let guard = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            guard
                .get(&(scope.to_string(), key.to_string()))
                .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
                .unwrap_or_default()
        };

        for listener in listeners {
            listener(value);
        }
    }

    /// Number of listeners for `scope`/`key`.
    pub fn count(&self, scope: &str, key: &str) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(scope.to_string(), key.to_string()))
            .map_or(0, Vec::len)
    }

    pub(crate) fn remove(&self, slot: &(String, String), id: u64) {
        let mut guard = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entries) = guard.get_mut(slot) {
            entries.retain(|(entry_id, _)| *entry_id != id);
            if entries.is_empty() {
                guard.remove(slot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, ChangeCallback) {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        let callback: ChangeCallback = Box::new(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        (hits, callback)
    }

    #[test]
    fn test_notify_only_matching_slot() {
        let registry = SubscriberRegistry::new();
        let (hits, callback) = counter();
        let _sub = registry.subscribe("u1", "insights", callback);

        registry.notify("u1", "insights", &json!([]));
        registry.notify("u2", "insights", &json!([]));
        registry.notify("u1", "other", &json!([]));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let registry = SubscriberRegistry::new();
        let (hits, callback) = counter();
        let sub = registry.subscribe("u1", "insights", callback);
        assert_eq!(registry.count("u1", "insights"), 1);

        drop(sub);
        registry.notify("u1", "insights", &json!(1));

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(registry.count("u1", "insights"), 0);
    }

    #[test]
    fn test_subscription_outliving_registry() {
        let registry = SubscriberRegistry::new();
        let (_hits, callback) = counter();
        let sub = registry.subscribe("u1", "k", callback);
        drop(registry);
        sub.unsubscribe();
    }

    #[test]
    fn test_callback_may_subscribe_during_notify() {
        let registry = SubscriberRegistry::new();
        let inner = Arc::clone(&registry);
        let nested: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));
        let nested_clone = Arc::clone(&nested);
        let _sub = registry.subscribe(
            "u1",
            "k",
            Box::new(move |_| {
                let sub = inner.subscribe("u1", "k", Box::new(|_| {}));
                nested_clone.lock().unwrap().push(sub);
            }),
        );

        registry.notify("u1", "k", &json!(null));

        assert_eq!(registry.count("u1", "k"), 2);
        nested.lock().unwrap().clear();
    }
}
