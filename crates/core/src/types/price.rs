//! Unit price representation.
//!
//! Prices are carried as `f64` and accumulated in floating point, matching the
//! product API which sends plain JSON numbers. Rounding happens only when a
//! price is rendered, via [`Price::display`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is NaN or infinite.
    #[error("price must be a finite number")]
    NonFinite,
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A unit price in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(f64);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(0.0);

    /// Create a validated price.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not finite or is negative.
    pub fn new(amount: f64) -> Result<Self, PriceError> {
        if !amount.is_finite() {
            return Err(PriceError::NonFinite);
        }
        if amount < 0.0 {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Get the raw amount.
    #[must_use]
    pub const fn amount(self) -> f64 {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * f64::from(quantity))
    }

    /// Format for display with two decimals (e.g., "$19.99").
    #[must_use]
    pub fn display(self) -> String {
        format!("${:.2}", self.0)
    }
}

impl From<f64> for Price {
    /// Wrap an amount that is already known to be valid, such as a computed total.
    fn from(amount: f64) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}
