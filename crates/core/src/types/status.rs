//! Status enums and role names.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Stock level shown on product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    /// Nothing left; the listing disables adding to the cart.
    OutOfStock,
    /// At or below the product's minimum stock threshold.
    Low,
    /// Comfortably in stock.
    Available,
}

impl StockLevel {
    /// Classify a stock count against a low-stock threshold.
    #[must_use]
    pub const fn classify(current_stock: u32, min_stock: u32) -> Self {
        if current_stock == 0 {
            Self::OutOfStock
        } else if current_stock <= min_stock {
            Self::Low
        } else {
            Self::Available
        }
    }

    /// Whether the product can be added to a cart.
    #[must_use]
    pub const fn can_add_to_cart(self) -> bool {
        !matches!(self, Self::OutOfStock)
    }
}

impl fmt::Display for StockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfStock => write!(f, "out_of_stock"),
            Self::Low => write!(f, "low"),
            Self::Available => write!(f, "available"),
        }
    }
}

/// A user role name as assigned by the user/role manager.
///
/// Role names are free-form and compared in normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Create a role from its name (trimmed, lowercased).
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Get the role name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
