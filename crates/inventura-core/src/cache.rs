//! Local value cache.
//!
//! Count values live on the counting device, one key per cadence, and are
//! never synced to the server. The key for a cadence is
//! `inventory-values-<cadence>`; its payload is a JSON object mapping item
//! id to `{value1, value2, value3, note, locked}`.
//!
//! # Invariants
//!
//! - A missing, unreadable, or malformed payload loads as an empty map.
//! - `clear` removes the key entirely; a later `load` yields an empty map.
//! - File writes go to a temp file and are renamed into place while an
//!   exclusive advisory lock is held.

use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::model::{Cadence, ValueMap};

/// Errors writing the value cache. Reads never fail.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("value cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("value cache encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Namespaced cache key for a cadence.
#[must_use]
pub fn cache_key(cadence: Cadence) -> String {
    format!("inventory-values-{}", cadence.as_str())
}

/// Decode a cache payload, treating anything malformed as empty.
#[must_use]
pub fn decode_values(raw: &str) -> ValueMap {
    if raw.trim().is_empty() {
        return ValueMap::new();
    }
    match serde_json::from_str::<ValueMap>(raw) {
        Ok(values) => values,
        Err(err) => {
            warn!(error = %err, "malformed value cache payload; starting empty");
            ValueMap::new()
        }
    }
}

/// Keyed store for per-cadence count values.
pub trait ValueStore {
    /// Load the values for `cadence`. Never fails.
    fn load(&self, cadence: Cadence) -> ValueMap;

    /// Replace the values for `cadence`.
    fn save(&mut self, cadence: Cadence, values: &ValueMap) -> Result<(), CacheError>;

    /// Drop the key for `cadence`.
    fn clear(&mut self, cadence: Cadence) -> Result<(), CacheError>;
}

/// In-memory store holding raw payloads, for tests and headless callers.
#[derive(Debug, Default, Clone)]
pub struct MemoryValueStore {
    entries: HashMap<String, String>,
}

impl MemoryValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a raw payload under a cadence key, bypassing encoding.
    pub fn insert_raw(&mut self, cadence: Cadence, raw: impl Into<String>) {
        self.entries.insert(cache_key(cadence), raw.into());
    }

    #[must_use]
    pub fn contains(&self, cadence: Cadence) -> bool {
        self.entries.contains_key(&cache_key(cadence))
    }
}

impl ValueStore for MemoryValueStore {
    fn load(&self, cadence: Cadence) -> ValueMap {
        self.entries
            .get(&cache_key(cadence))
            .map(|raw| decode_values(raw))
            .unwrap_or_default()
    }

    fn save(&mut self, cadence: Cadence, values: &ValueMap) -> Result<(), CacheError> {
        let raw = serde_json::to_string(values)?;
        self.entries.insert(cache_key(cadence), raw);
        Ok(())
    }

    fn clear(&mut self, cadence: Cadence) -> Result<(), CacheError> {
        self.entries.remove(&cache_key(cadence));
        Ok(())
    }
}

/// File-backed store: `<dir>/inventory-values-<cadence>.json`.
#[derive(Debug, Clone)]
pub struct FileValueStore {
    dir: PathBuf,
}

impl FileValueStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, cadence: Cadence) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key(cadence)))
    }

    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T, CacheError>) -> Result<T, CacheError> {
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let lock_path = self.dir.join(".lock");
        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| CacheError::Io {
                path: lock_path.clone(),
                source,
            })?;
        lock.lock_exclusive().map_err(|source| CacheError::Io {
            path: lock_path.clone(),
            source,
        })?;
        let result = f();
        let _ = lock.unlock();
        result
    }
}

impl ValueStore for FileValueStore {
    fn load(&self, cadence: Cadence) -> ValueMap {
        let path = self.path_for(cadence);
        match fs::read_to_string(&path) {
            Ok(raw) => decode_values(&raw),
            Err(err) if err.kind() == io::ErrorKind::NotFound => ValueMap::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable value cache; starting empty");
                ValueMap::new()
            }
        }
    }

    fn save(&mut self, cadence: Cadence, values: &ValueMap) -> Result<(), CacheError> {
        let path = self.path_for(cadence);
        let raw = serde_json::to_vec_pretty(values)?;
        self.with_lock(|| {
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, &raw).map_err(|source| CacheError::Io {
                path: tmp.clone(),
                source,
            })?;
            fs::rename(&tmp, &path).map_err(|source| CacheError::Io {
                path: path.clone(),
                source,
            })?;
            debug!(cadence = %cadence, entries = values.len(), "value cache saved");
            Ok(())
        })
    }

    fn clear(&mut self, cadence: Cadence) -> Result<(), CacheError> {
        let path = self.path_for(cadence);
        self.with_lock(|| match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Io {
                path: path.clone(),
                source,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CountValue;

    fn sample() -> ValueMap {
        let mut values = ValueMap::new();
        values.insert(
            "itm-1".into(),
            CountValue {
                value1: 3.0,
                note: "back room".into(),
                locked: true,
                ..CountValue::default()
            },
        );
        values
    }

    #[test]
    fn cache_key_is_namespaced_by_cadence() {
        assert_eq!(cache_key(Cadence::Weekly), "inventory-values-weekly");
    }

    #[test]
    fn malformed_payload_decodes_empty() {
        assert!(decode_values("{not json").is_empty());
        assert!(decode_values("[1,2,3]").is_empty());
        assert!(decode_values("").is_empty());
    }

    #[test]
    fn memory_store_keys_are_independent() {
        let mut store = MemoryValueStore::new();
        store.save(Cadence::Daily, &sample()).expect("save");
        assert_eq!(store.load(Cadence::Daily), sample());
        assert!(store.load(Cadence::Monthly).is_empty());

        store.clear(Cadence::Daily).expect("clear");
        assert!(!store.contains(Cadence::Daily));
    }

    #[test]
    fn file_store_roundtrip_and_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileValueStore::new(dir.path().join("values"));
        assert!(store.load(Cadence::Daily).is_empty());

        store.save(Cadence::Daily, &sample()).expect("save");
        assert!(store.path_for(Cadence::Daily).exists());
        assert_eq!(store.load(Cadence::Daily), sample());

        store.clear(Cadence::Daily).expect("clear");
        assert!(!store.path_for(Cadence::Daily).exists());
        store.clear(Cadence::Daily).expect("clear twice");
    }

    #[test]
    fn file_store_tolerates_corruption() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileValueStore::new(dir.path());
        fs::write(store.path_for(Cadence::Monthly), "{\"itm-1\": oops").expect("write");
        assert!(store.load(Cadence::Monthly).is_empty());
    }
}
