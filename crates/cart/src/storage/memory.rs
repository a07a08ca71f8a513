//! In-memory storage.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{CartStorage, StorageError, validate_key};

/// Shared in-process key/value map.
///
/// Cloning yields another handle onto the same entries, which is how tests
/// model several open pages of one storage origin.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("keys", &self.len())
            .finish()
    }
}

impl CartStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));

        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let storage = MemoryStorage::new();
        assert!(storage.remove("never-set").is_ok());
    }

    #[test]
    fn test_clones_share_entries() {
        let first = MemoryStorage::new();
        let second = first.clone();
        first.set("k", "v").unwrap();
        assert_eq!(second.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_invalid_key_rejected() {
        let storage = MemoryStorage::new();
        assert!(storage.set("../escape", "v").is_err());
    }
}
