//! Persistence collaborator for the cart store.
//!
//! The store persists one opaque string blob under a fixed key, scoped
//! to whatever medium the implementation chooses. Failures here never
//! escape the cart store; they degrade to an empty cart.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

/// Fixed key the cart blob is stored under.
pub const CART_STORAGE_KEY: &str = "bravex_cart";

/// Errors that can occur reading or writing cart storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage medium refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Get/set of a single opaque string blob under a fixed key.
pub trait CartStorage {
    /// Read the stored blob, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium cannot be read.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium cannot be written.
    fn save(&mut self, blob: &str) -> Result<(), StorageError>;
}

/// In-memory storage, keyed like a browser's local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(CART_STORAGE_KEY).cloned())
    }

    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        self.entries
            .insert(CART_STORAGE_KEY.to_string(), blob.to_string());
        Ok(())
    }
}

/// File-backed storage for carts that survive a restart.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Store the cart at an explicit file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the cart under the fixed cart key inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(format!("{CART_STORAGE_KEY}.json")),
        }
    }
}

impl CartStorage for FileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, blob)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        assert!(storage.load().unwrap().is_none());

        storage.save("[1,2,3]").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!(
            "bravex-storage-test-{}",
            std::process::id()
        ));
        let mut storage = FileStorage::in_dir(&dir);

        assert!(storage.load().unwrap().is_none());
        storage.save("{\"cart\":[]}").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("{\"cart\":[]}"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
