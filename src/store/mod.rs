//! Assignment Store - durable per-browser key-value persistence
//!
//! Provides a small string-keyed KV abstraction with:
//! - In-memory and file-backed backends
//! - An `AssignmentStore` wrapper owning the `assignment:<experiment>` key
//!   pattern and the never-propagate failure policy
//!
//! # Example
//!
//! ```rust
//! use sorteo::store::{KvStore, MemoryKvStore};
//!
//! # fn main() -> sorteo::Result<()> {
//! let store = MemoryKvStore::new();
//!
//! store.set("key", "value")?;
//! assert_eq!(store.get("key")?, Some("value".to_string()));
//!
//! store.remove("key")?;
//! assert_eq!(store.get("key")?, None);
//! # Ok(())
//! # }
//! ```

mod file;
mod memory;

pub use file::FileKvStore;
pub use memory::MemoryKvStore;

use std::sync::Arc;

use tracing::warn;

use crate::Result;

/// Key under which the visitor identity is persisted.
pub const VISITOR_ID_KEY: &str = "visitor_id";

/// String-keyed storage seam for identities and assignments.
///
/// Backends are `Send + Sync` so one store can be shared across the context
/// and the identity provider. The values are plain strings; nothing in this
/// crate needs a structured or binary encoding.
pub trait KvStore: Send + Sync {
    /// Get a value by key. Returns `None` if the key doesn't exist.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value for a key. Overwrites any existing value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. No-op if the key doesn't exist.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Storage key for an experiment's assignment.
#[must_use]
pub fn assignment_key(experiment_name: &str) -> String {
    format!("assignment:{experiment_name}")
}

/// Persists one variant key per experiment.
///
/// Backend failures never propagate. Every write is mirrored into a
/// session-local in-memory map, so when the backend drops a write or fails
/// a read the first computed assignment still sticks for the lifetime of
/// this store - assignments become session-only, and participation is not
/// re-reported on later reads. Cross-session stability is lost in that
/// mode, the same trade the identity provider makes.
///
/// Callers must read before writing; the context enforces this, which is
/// what makes assignments immutable once created.
#[derive(Clone)]
pub struct AssignmentStore {
    kv: Arc<dyn KvStore>,
    session: Arc<MemoryKvStore>,
}

impl AssignmentStore {
    /// Create an assignment store over a shared KV backend.
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            session: Arc::new(MemoryKvStore::new()),
        }
    }

    /// Get the stored variant key for an experiment, if any.
    ///
    /// The stored string is returned verbatim: if a definition renamed its
    /// variant keys since the assignment was written, the orphaned key comes
    /// back unresolved rather than being silently repaired.
    #[must_use]
    pub fn get(&self, experiment_name: &str) -> Option<String> {
        let key = assignment_key(experiment_name);
        match self.kv.get(&key) {
            Ok(Some(value)) => Some(value),
            // a write the backend dropped earlier may still live in the
            // session mirror; values are immutable so the two never disagree
            Ok(None) => self.session.get(&key).unwrap_or_default(),
            Err(e) => {
                warn!(experiment = experiment_name, error = %e, "assignment read failed, using session mirror");
                self.session.get(&key).unwrap_or_default()
            }
        }
    }

    /// Persist the variant key for an experiment.
    pub fn set(&self, experiment_name: &str, variant_key: &str) {
        let key = assignment_key(experiment_name);
        // MemoryKvStore::set is infallible
        let _ = self.session.set(&key, variant_key);
        if let Err(e) = self.kv.set(&key, variant_key) {
            warn!(experiment = experiment_name, error = %e, "assignment write failed, session-only");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_key_pattern() {
        assert_eq!(assignment_key("pricing_page_layout"), "assignment:pricing_page_layout");
    }

    #[test]
    fn test_assignment_store_round_trip() {
        let store = AssignmentStore::new(Arc::new(MemoryKvStore::new()));

        assert_eq!(store.get("exp"), None);
        store.set("exp", "variant_a");
        assert_eq!(store.get("exp"), Some("variant_a".to_string()));
    }

    #[test]
    fn test_assignment_store_scoped_per_experiment() {
        let store = AssignmentStore::new(Arc::new(MemoryKvStore::new()));

        store.set("exp_one", "control");
        store.set("exp_two", "variant_a");
        assert_eq!(store.get("exp_one"), Some("control".to_string()));
        assert_eq!(store.get("exp_two"), Some("variant_a".to_string()));
    }

    #[test]
    fn test_kv_set_get_remove() {
        let store = MemoryKvStore::new();

        store.set("key1", "value1").unwrap();
        assert_eq!(store.get("key1").unwrap(), Some("value1".to_string()));

        store.set("key1", "value2").unwrap();
        assert_eq!(store.get("key1").unwrap(), Some("value2".to_string()));

        store.remove("key1").unwrap();
        assert_eq!(store.get("key1").unwrap(), None);

        // remove on a missing key is a no-op
        store.remove("key1").unwrap();
    }

    #[test]
    fn test_kv_get_nonexistent() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("nonexistent").unwrap(), None);
    }

    /// Backend where every operation fails, simulating unavailable storage.
    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(crate::Error::Storage("unavailable".to_string()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(crate::Error::Storage("unavailable".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(crate::Error::Storage("unavailable".to_string()))
        }
    }

    #[test]
    fn test_broken_backend_degrades_to_session_mirror() {
        let store = AssignmentStore::new(Arc::new(BrokenStore));

        assert_eq!(store.get("exp"), None);
        store.set("exp", "variant_a");
        // the dropped write survives in the session mirror
        assert_eq!(store.get("exp"), Some("variant_a".to_string()));
    }
}
