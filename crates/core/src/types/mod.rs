//! Core types for Tienda.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use id::*;
pub use price::{Price, PriceError};
pub use product::ProductSnapshot;
pub use status::*;
