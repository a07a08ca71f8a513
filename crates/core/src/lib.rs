//! Tienda Core - Shared types library.
//!
//! This crate provides common types used across all Tienda components:
//! - `cart` - Client-side shopping cart store and its views
//! - `cli` - Command-line driver for the cart store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Canonical product ids, prices, product snapshots, stock levels and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
