//! Key-value device storage with XDG path support.
//!
//! [`FileStorage`] keeps one pretty-printed JSON file per key under
//! `~/.local/share/fsales/` (platform equivalent elsewhere). Writes are atomic
//! (temp file + rename). [`MemoryStorage`] is the in-process equivalent.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use directories::ProjectDirs;
use serde_json::Value;
use thiserror::Error;

/// Application qualifier (for XDG paths).
const QUALIFIER: &str = "";

/// Application organization (for XDG paths).
const ORGANIZATION: &str = "";

/// Application name (for XDG paths).
const APPLICATION: &str = "fsales";

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to determine the data directory.
    #[error("failed to determine data directory: no valid home directory found")]
    NoDataDir,

    /// Key contains characters that cannot be used in a file name.
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    /// I/O error during file read.
    #[error("failed to read storage file '{path}': {source}")]
    ReadError {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// I/O error during file write.
    #[error("failed to write storage file '{path}': {source}")]
    WriteError {
        /// The path that failed to write.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// I/O error during directory creation.
    #[error("failed to create storage directory '{path}': {source}")]
    CreateDirError {
        /// The directory path that failed to create.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// I/O error during file delete.
    #[error("failed to delete storage file '{path}': {source}")]
    DeleteError {
        /// The path that failed to delete.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Device-local key-value storage.
pub trait LocalStorage {
    /// Returns the value stored under `key`, or `None` if there is none.
    fn get_item(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &Value) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

impl<L: LocalStorage + ?Sized> LocalStorage for &L {
    fn get_item(&self, key: &str) -> Result<Option<Value>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &Value) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

/// File-backed storage: one JSON file per key in a directory.
///
/// # Thread Safety
///
/// `FileStorage` is [`Send`] and [`Sync`], but concurrent writes to the same
/// key race (last rename wins). In typical CLI usage the storage is owned by a
/// single task.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates storage in the default XDG data directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NoDataDir` if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: Self::default_dir()?,
        })
    }

    /// Creates storage in a custom directory. Primarily useful for testing.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Returns the default XDG data directory.
    ///
    /// On Unix: `~/.local/share/fsales`
    /// On macOS: `~/Library/Application Support/fsales`
    pub fn default_dir() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .ok_or(StorageError::NoDataDir)?;
        Ok(project_dirs.data_dir().to_path_buf())
    }

    /// Returns the storage directory.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key)?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::ReadError { path, source: e }),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn set_item(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::CreateDirError {
            path: self.dir.clone(),
            source: e,
        })?;

        let json = serde_json::to_string_pretty(value)?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &json).map_err(|e| StorageError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        fs::rename(&temp_path, &path).map_err(|e| StorageError::WriteError {
            path: path.clone(),
            source: e,
        })?;

        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteError { path, source: e }),
        }
    }
}

/// In-memory storage, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        // A poisoned map is still a valid map.
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &Value) -> Result<()> {
        self.items().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::with_dir(dir.path().to_path_buf());
        assert!(storage.get_item("prefs").unwrap().is_none());
    }

    #[test]
    fn test_file_storage_set_then_get() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::with_dir(dir.path().join("nested"));

        storage.set_item("prefs", &json!({"enabled": true})).unwrap();

        assert_eq!(storage.get_item("prefs").unwrap(), Some(json!({"enabled": true})));
        assert!(dir.path().join("nested").join("prefs.json").exists());
        assert!(!dir.path().join("nested").join("prefs.tmp").exists());
    }

    #[test]
    fn test_file_storage_overwrite_and_remove() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::with_dir(dir.path().to_path_buf());

        storage.set_item("k", &json!(1)).unwrap();
        storage.set_item("k", &json!(2)).unwrap();
        assert_eq!(storage.get_item("k").unwrap(), Some(json!(2)));

        storage.remove_item("k").unwrap();
        assert!(storage.get_item("k").unwrap().is_none());
        // Removing again is fine.
        storage.remove_item("k").unwrap();
    }

    #[test]
    fn test_file_storage_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::with_dir(dir.path().to_path_buf());

        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(
                matches!(storage.get_item(key), Err(StorageError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_file_storage_corrupt_file_is_json_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        let storage = FileStorage::with_dir(dir.path().to_path_buf());

        assert!(matches!(storage.get_item("broken"), Err(StorageError::Json(_))));
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        storage.set_item("a", &json!("x")).unwrap();
        assert_eq!(storage.get_item("a").unwrap(), Some(json!("x")));
        storage.remove_item("a").unwrap();
        assert!(storage.get_item("a").unwrap().is_none());
    }
}
