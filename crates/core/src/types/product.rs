//! Product snapshot handed to the cart by listing views.
//!
//! The product API is loose about numeric fields: prices and stock levels may
//! arrive as numbers, numeric strings, or `null`. Deserialization accepts all
//! of those and normalizes them; anything unusable becomes `NaN` (price) or `0`
//! (stock) so validation can reject it later with a clear reason.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::id::ProductId;
use super::status::StockLevel;

/// Point-in-time copy of a product, as shown in a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product identifier. Absent ids are representable so they can be rejected.
    #[serde(default)]
    pub id: Option<ProductId>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Unit price.
    #[serde(default = "missing_price", deserialize_with = "lenient_price")]
    pub price: f64,
    /// Units in stock when the listing was fetched.
    #[serde(default, alias = "stock", deserialize_with = "lenient_count")]
    pub current_stock: u32,
    /// Threshold at or below which stock is reported as low.
    #[serde(default, alias = "stock_minimo", deserialize_with = "lenient_count")]
    pub min_stock: u32,
    /// Product image.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProductSnapshot {
    /// Create a snapshot with no image and no low-stock threshold.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: f64, current_stock: u32) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            price,
            current_stock,
            min_stock: 0,
            image_url: None,
        }
    }

    /// Set the image URL.
    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Set the low-stock threshold.
    #[must_use]
    pub const fn with_min_stock(mut self, min_stock: u32) -> Self {
        self.min_stock = min_stock;
        self
    }

    /// Image URL, treating an empty string as no image.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    /// Classify the stock level for listing badges.
    #[must_use]
    pub const fn stock_level(&self) -> StockLevel {
        StockLevel::classify(self.current_stock, self.min_stock)
    }
}

const fn missing_price() -> f64 {
    f64::NAN
}

fn lenient_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let count = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(f64_to_count)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(count.map_or(0, |c| u32::try_from(c).unwrap_or(u32::MAX)))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn f64_to_count(value: f64) -> u64 {
    value.floor() as u64
}
