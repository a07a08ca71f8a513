//! Tienda Cart - client-side shopping cart store.
//!
//! The cart lives in a key/value storage origin (the analogue of browser
//! local storage) and is owned by a single [`CartStore`]. Every mutation is
//! validated against the stock snapshotted into each line, persisted, and then
//! broadcast to subscribers so dependent views stay in sync.
//!
//! # Modules
//!
//! - [`store`] - The cart store and its aggregate queries
//! - [`line`] - Persisted cart line type
//! - [`events`] - Change notifications and subscriptions
//! - [`storage`] - Storage backends (memory and file)
//! - [`view`] - Badge and cart page view models
//! - [`session`] - Consumed authentication capability, checkout and logout
//! - [`config`] - Environment configuration
//! - [`error`] - Error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod events;
pub mod line;
pub mod session;
pub mod storage;
pub mod store;
pub mod view;

pub use config::{CartConfig, ConfigError};
pub use error::{CartError, Result};
pub use events::{CartChange, CartEvent, Subscription};
pub use line::CartLine;
pub use session::{CurrentUser, SessionProvider, StorageSession};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};
pub use store::{AddOutcome, CartStore};
