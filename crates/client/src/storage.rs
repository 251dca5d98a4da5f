//! Persistent key-value storage behind an injectable trait.
//!
//! The contract mirrors web storage: whole string values under string keys,
//! no transactions, and concurrent writers racing with last-write-wins.
//! Embedders provide whatever scoped storage their platform has; this module
//! ships an in-memory store for tests and ephemeral use plus a JSON file
//! store for native embedders.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::warn;

/// Directory under the user config dir holding client state.
const STORAGE_DIR: &str = "mangosteen";
/// File name of the JSON store.
const STORAGE_FILE: &str = "storage.json";

/// Errors that can occur when reading or writing persistent storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Neither `XDG_CONFIG_HOME` nor `HOME` is set.
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    /// The backing file could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The entries could not be encoded for the backing file.
    #[error("storage encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Scoped string key-value storage.
///
/// Implementations must tolerate concurrent use from several threads; they
/// are shared as `Arc<dyn KeyValueStore>` across the cart, merge, and theme
/// components.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be read at all.
    /// An absent key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error when the value could not be persisted (the web
    /// storage quota analog).
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error when the removal could not be persisted.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and ephemeral embedders.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store holding one JSON object of string entries.
///
/// Every read loads the file fresh and every write rewrites it, so separate
/// processes sharing the file observe each other's writes and race with
/// last-write-wins, matching the web storage contract. A corrupt or
/// unreadable file reads as empty (logged at warn); only write failures
/// surface as errors.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store over the given file. The file and its parent
    /// directories are created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at [`default_path`](Self::default_path).
    ///
    /// # Errors
    ///
    /// Returns an error when no home directory can be determined.
    pub fn with_default_path() -> Result<Self, StorageError> {
        Ok(Self::new(Self::default_path()?))
    }

    /// The conventional store location:
    /// `$XDG_CONFIG_HOME/mangosteen/storage.json`, falling back to
    /// `$HOME/.config/mangosteen/storage.json`.
    ///
    /// # Errors
    ///
    /// Returns an error when neither `XDG_CONFIG_HOME` nor `HOME` is set.
    pub fn default_path() -> Result<PathBuf, StorageError> {
        let base = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => {
                let home =
                    std::env::var("HOME").map_err(|_| StorageError::MissingHomeDirectory)?;
                Path::new(&home).join(".config")
            }
        };
        Ok(base.join(STORAGE_DIR).join(STORAGE_FILE))
    }

    /// The file this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "storage file unreadable, treating as empty"
                );
                return BTreeMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "storage file is not valid JSON, treating as empty"
                );
                BTreeMap::new()
            }
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.load();
        entries.insert(key.to_owned(), value.to_owned());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.load();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();

        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));

        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v2".to_string()));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_memory_store_remove_absent_is_noop() {
        let store = MemoryStore::new();
        store.remove("never-set").unwrap();
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let writer = JsonFileStore::new(&path);
        writer.set("cart", "[]").unwrap();

        let reader = JsonFileStore::new(&path);
        assert_eq!(reader.get("cart").unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn test_file_store_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("storage.json");

        let store = JsonFileStore::new(&path);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));

        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(store.get("k").unwrap(), None);

        // A write replaces the corrupt content with a valid file.
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_file_store_remove_absent_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let store = JsonFileStore::new(&path);
        store.remove("k").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_file_store_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let a = JsonFileStore::new(&path);
        let b = JsonFileStore::new(&path);

        a.set("k", "from-a").unwrap();
        b.set("k", "from-b").unwrap();

        assert_eq!(a.get("k").unwrap(), Some("from-b".to_string()));
    }
}
