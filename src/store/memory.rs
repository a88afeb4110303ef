//! In-memory settings store.
//!
//! For tests and for embedders that route persistence through their own
//! settings system and only need the notifier's state for one process
//! lifetime.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{SettingsStore, StoreError};

/// Volatile store; "durable flush" is a no-op by definition.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_round_trip() {
        let store = MemoryStore::default();
        store.set("skipped_version", "2.3.0").unwrap();
        assert_eq!(store.get("skipped_version").as_deref(), Some("2.3.0"));
        store.remove("skipped_version").unwrap();
        assert!(store.get("skipped_version").is_none());
    }

    #[test]
    fn reset_clears_all_keys() {
        let store = MemoryStore::default();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.reset().unwrap();
        assert!(store.get("a").is_none());
        assert!(store.get("b").is_none());
    }
}
