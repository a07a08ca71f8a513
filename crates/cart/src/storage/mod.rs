//! Key/value storage backends.
//!
//! The cart, the bearer token and the current user each live under their own
//! string key, the same way the storefront pages keep them in browser local
//! storage. Backends only move strings around; serialization is the caller's
//! concern.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - shared in-process map; clones share the same entries
//! - [`FileStorage`] - one file per key under a root directory

use std::sync::Arc;

use thiserror::Error;

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key cannot be used by any backend.
    #[error("invalid storage key {0:?}: {1}")]
    InvalidKey(String, &'static str),

    /// Underlying I/O failed.
    #[error("storage I/O failed for {key:?}: {source}")]
    Io {
        /// Key being accessed.
        key: String,
        /// Original error.
        #[source]
        source: std::io::Error,
    },
}

/// Abstraction over string storage for one origin.
///
/// Implementations are synchronous: the store treats reads and writes as
/// instantaneous local operations.
pub trait CartStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`.
    ///
    /// Returns Ok even if the key doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: CartStorage + ?Sized> CartStorage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<T: CartStorage + ?Sized> CartStorage for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Check that a key is usable by every backend.
///
/// Keys double as file names for [`FileStorage`], so they must be non-empty,
/// must not contain path separators, and must not start with a dot.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] describing the first violated rule.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let reason = if key.trim().is_empty() {
        Some("must not be empty")
    } else if key.contains(|c: char| c == '/' || c == '\\') {
        Some("must not contain path separators")
    } else if key.starts_with('.') {
        Some("must not start with a dot")
    } else if key.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StorageError::InvalidKey(key.to_string(), reason)),
        None => Ok(()),
    }
}
