//! In-memory KV store implementation using `DashMap`.
//!
//! Session-only: data is lost when the process ends. This is also the
//! degraded-mode behavior when durable storage is unavailable, so
//! `FileKvStore` reuses it as its cache.

use dashmap::DashMap;

use super::KvStore;
use crate::Result;

/// In-memory key-value store using a lock-free concurrent hashmap.
///
/// # Example
///
/// ```rust
/// use sorteo::store::{KvStore, MemoryKvStore};
///
/// # fn main() -> sorteo::Result<()> {
/// let store = MemoryKvStore::new();
/// store.set("hello", "world")?;
/// assert_eq!(store.get("hello")?, Some("world".to_string()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: DashMap<String, String>,
}

impl MemoryKvStore {
    /// Create a new in-memory KV store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Get the number of entries in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Snapshot the entries (for the file backend's flush).
    pub(crate) fn snapshot(&self) -> std::collections::BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_and_is_empty() {
        let store = MemoryKvStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);

        store.set("key1", "value1").unwrap();
        assert!(!store.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear() {
        let store = MemoryKvStore::new();
        store.set("key1", "value1").unwrap();
        store.set("key2", "value2").unwrap();

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.get("key1").unwrap(), None);
    }

    #[test]
    fn test_empty_key_and_value() {
        let store = MemoryKvStore::new();
        store.set("", "").unwrap();
        assert_eq!(store.get("").unwrap(), Some(String::new()));
    }

    #[test]
    fn test_concurrent_writers() {
        use std::sync::Arc;

        let store = Arc::new(MemoryKvStore::new());
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.set(&format!("key{i}"), &format!("value{i}")).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..32 {
            assert_eq!(
                store.get(&format!("key{i}")).unwrap(),
                Some(format!("value{i}"))
            );
        }
    }
}
