//! In-memory store implementation.
//!
//! Data lives in a [`HashMap`] behind a [`RwLock`] and is lost when the
//! process exits.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use super::{LocalStore, StoreError};

/// Thread-safe, in-memory implementation of [`LocalStore`].
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store, created on first use. Clients built without an
    /// explicit store share this one, the way pages on one origin share their
    /// local storage.
    pub fn shared() -> Arc<MemoryStore> {
        static SHARED: OnceLock<Arc<MemoryStore>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(MemoryStore::new())))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, String>> {
        self.items.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, String>> {
        self.items.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl LocalStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("a").unwrap(), None);
        store.set_item("a", "1").unwrap();
        store.set_item("a", "2").unwrap();
        assert_eq!(store.get_item("a").unwrap().as_deref(), Some("2"));
        store.remove_item("a").unwrap();
        store.remove_item("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn prefix_listing() {
        let store = MemoryStore::new();
        store.set_item("x_1", "").unwrap();
        store.set_item("x_2", "").unwrap();
        store.set_item("y_1", "").unwrap();
        let mut keys = store.keys_with_prefix("x_").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["x_1", "x_2"]);
    }

    #[test]
    fn shared_is_one_instance() {
        assert!(Arc::ptr_eq(&MemoryStore::shared(), &MemoryStore::shared()));
    }
}
