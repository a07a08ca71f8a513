//! Cart error types.
//!
//! Every failure is local and recoverable: the store rejects the operation,
//! leaves the persisted cart untouched, and hands one of these back to the
//! caller, which decides whether to show a message or just re-render.

use thiserror::Error;

use tienda_core::ProductId;

use crate::storage::StorageError;

/// Error returned by cart store operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity exceeds the stock snapshotted for the product.
    #[error("Insufficient stock. Available: {available}")]
    InsufficientStock {
        /// Stock ceiling the request was checked against.
        available: u32,
        /// Quantity the line would have ended up with.
        requested: u64,
    },

    /// No cart line matches the product id.
    #[error("Not found: {0}")]
    NotFound(ProductId),

    /// Input rejected before any mutation (missing id, bad price or quantity).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The cart could not be serialized for storage.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage backend failed to persist the cart.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CartError {
    /// Message suitable for showing to a shopper.
    ///
    /// Storage details are not exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(_) | Self::Serialization(_) => "The cart could not be saved".to_string(),
            Self::NotFound(_) => "That product is no longer in the cart".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
