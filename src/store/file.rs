//! File-backed KV store: a JSON object persisted to one path.
//!
//! Writes go through an in-memory cache and are flushed to disk after every
//! mutation. When the path cannot be read or written the store degrades to
//! session-only (the cache keeps serving reads and writes) - persistence
//! failures are a known limitation of the environment, not a defect, so
//! they are logged and never propagated.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::{KvStore, MemoryKvStore};
use crate::Result;

/// Durable string-keyed store over a single JSON file.
///
/// The on-disk format is a flat JSON object, one entry per key - e.g.
/// `{"visitor_id": "v-...", "assignment:pricing_page_layout": "variant_a"}`.
#[derive(Debug)]
pub struct FileKvStore {
    path: PathBuf,
    cache: MemoryKvStore,
}

impl FileKvStore {
    /// Open a store at `path`, loading any existing entries.
    ///
    /// Never fails: a missing file starts empty, an unreadable or corrupt
    /// file starts empty with a warning (existing data is left untouched
    /// until the first successful flush).
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = MemoryKvStore::new();
        match Self::load(&path) {
            Ok(entries) => {
                for (key, value) in &entries {
                    // MemoryKvStore::set is infallible
                    let _ = cache.set(key, value);
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load store, starting empty");
            }
        }
        Self { path, cache }
    }

    /// Get the path this store persists to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn flush(&self) -> Result<()> {
        let encoded = serde_json::to_string_pretty(&self.cache.snapshot())?;
        fs::write(&self.path, encoded)?;
        Ok(())
    }

    fn flush_or_warn(&self) {
        if let Err(e) = self.flush() {
            warn!(path = %self.path.display(), error = %e, "flush failed, entries are session-only");
        }
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.cache.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.cache.set(key, value)?;
        self.flush_or_warn();
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.cache.remove(key)?;
        self.flush_or_warn();
        Ok(())
    }
}
