use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{info, warn};

/// Error raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Narrow key-value contract the store is built on: `get` returns the
/// stored string or absent, `set` overwrites, `remove` deletes. Mirrors the
/// local-storage slot the browser build of this app persisted into.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;
    fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;
    fn remove(&self, key: &str) -> Result<(), BackendError>;
}

/// File-per-key storage under a data directory.
///
/// Each key is stored as a single flat file at `{dir}/{key}`. Keys are
/// fixed application constants, never user input.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Result<Self, BackendError> {
        std::fs::create_dir_all(&dir)?;
        info!("Storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        match std::fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        std::fs::write(self.key_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Key {} already gone", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory backend for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let entries = self.entries.lock().map_err(|_| BackendError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut entries = self.entries.lock().map_err(|_| BackendError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let mut entries = self.entries.lock().map_err(|_| BackendError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_backend_get_absent_key() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(backend.get("missing").unwrap(), None);
    }

    #[test]
    fn file_backend_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();

        backend.set("k", "v1").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v1"));

        backend.set("k", "v2").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn file_backend_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();

        backend.set("k", "v").unwrap();
        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);

        // second remove of the same key still succeeds
        backend.remove("k").unwrap();
    }

    #[test]
    fn memory_backend_set_get_remove() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("k").unwrap(), None);

        backend.set("k", "v").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v"));

        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
    }
}
