//! Visitor Identity Provider - stable anonymous identifier per browser
//!
//! The identity is an opaque string, created lazily on first access and
//! persisted for the lifetime of the client storage. This subsystem never
//! deletes it.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use tracing::warn;

use crate::store::{KvStore, VISITOR_ID_KEY};

/// Produces and retrieves the stable anonymous visitor identifier.
///
/// When the backing store cannot persist, the provider still returns a
/// usable identifier that stays stable for the lifetime of this provider
/// instance (one session). Cross-session stability is sacrificed in that
/// mode - a known limitation, not a defect.
#[derive(Clone)]
pub struct IdentityProvider {
    kv: Arc<dyn KvStore>,
    session_fallback: Arc<OnceLock<String>>,
}

impl IdentityProvider {
    /// Create a provider over a shared KV backend.
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            session_fallback: Arc::new(OnceLock::new()),
        }
    }

    /// Get the persisted identity, creating and persisting one on first call.
    ///
    /// Never fails. Repeated calls return the same value: from storage when
    /// it works, from the session fallback when it doesn't.
    #[must_use]
    pub fn get_or_create(&self) -> String {
        match self.kv.get(VISITOR_ID_KEY) {
            Ok(Some(id)) => return id,
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "visitor identity read failed, using session identity");
            }
        }

        let id = self.session_fallback.get_or_init(generate_identity).clone();
        if let Err(e) = self.kv.set(VISITOR_ID_KEY, &id) {
            warn!(error = %e, "visitor identity write failed, identity is session-only");
        }
        id
    }
}

/// Generate a fresh identifier: creation timestamp plus a random suffix.
///
/// The timestamp distinguishes identities created at different moments; the
/// random component covers collisions within the same millisecond.
fn generate_identity() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u64 = rand::random();
    format!("v-{millis:x}-{suffix:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKvStore;
    use crate::Result;

    #[test]
    fn test_identity_stable_across_calls() {
        let provider = IdentityProvider::new(Arc::new(MemoryKvStore::new()));
        let first = provider.get_or_create();
        assert_eq!(provider.get_or_create(), first);
    }

    #[test]
    fn test_identity_shared_through_store() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let first = IdentityProvider::new(Arc::clone(&kv)).get_or_create();
        let second = IdentityProvider::new(kv).get_or_create();
        assert_eq!(first, second);
    }

    #[test]
    fn test_identity_format() {
        let provider = IdentityProvider::new(Arc::new(MemoryKvStore::new()));
        let id = provider.get_or_create();
        assert!(id.starts_with("v-"));
        assert_eq!(id.split('-').count(), 3);
    }

    /// Store that fails every operation, simulating unavailable persistence.
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
    fn test_degraded_mode_stays_stable_within_session() {
        let provider = IdentityProvider::new(Arc::new(BrokenStore));
        let first = provider.get_or_create();
        assert_eq!(provider.get_or_create(), first);
        assert!(!first.is_empty());
    }
}
