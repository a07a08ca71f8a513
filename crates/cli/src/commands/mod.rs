//! Command implementations.
//!
//! Commands write their output to a caller-supplied writer so they can be
//! exercised against a buffer in tests.

use std::path::PathBuf;

use thiserror::Error;

use tienda_cart::session::CheckoutError;
use tienda_cart::{
    CartConfig, CartError, CartStore, ConfigError, FileStorage, StorageError, StorageSession,
};

pub mod cart;
pub mod session;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{}", .0.user_message())]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Sign in to see your cart")]
    LoginRequired,

    #[error("{0} is out of stock")]
    OutOfStock(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cart and session opened over the configured storage directory.
pub struct Context {
    pub store: CartStore<FileStorage>,
    pub session: StorageSession<FileStorage>,
}

impl Context {
    /// Load configuration and open storage.
    ///
    /// `dir` overrides the configured storage directory.
    pub fn load(dir: Option<PathBuf>) -> Result<Self, CommandError> {
        let mut config = CartConfig::from_env()?;
        if let Some(dir) = dir {
            config.storage_dir = dir;
        }
        Self::open(&config)
    }

    /// Open storage described by `config`.
    pub fn open(config: &CartConfig) -> Result<Self, CommandError> {
        let storage = FileStorage::open(config.storage_dir.clone())?;
        tracing::debug!(dir = %config.storage_dir.display(), key = %config.cart_key, "storage opened");
        Ok(Self {
            store: CartStore::with_key(storage.clone(), config.cart_key.clone())?,
            session: StorageSession::new(storage),
        })
    }
}
