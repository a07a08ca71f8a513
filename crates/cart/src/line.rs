//! Persisted cart line.

use serde::{Deserialize, Serialize};

use tienda_core::{Price, ProductId, ProductSnapshot};

/// One row per distinct product in the cart.
///
/// Name, price, stock ceiling and image are copied from the product when the
/// line is created and are not re-fetched afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product identifier, canonical string form.
    pub id: ProductId,
    /// Display name at add-time.
    pub name: String,
    /// Unit price at add-time.
    pub price: Price,
    /// Units of the product in the cart; always at least 1.
    pub quantity: u32,
    /// Stock ceiling used for local validation.
    pub current_stock: u32,
    /// Product image at add-time.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartLine {
    /// Build a new line from a validated product snapshot.
    #[must_use]
    pub fn from_product(
        id: ProductId,
        product: &ProductSnapshot,
        price: Price,
        quantity: u32,
    ) -> Self {
        Self {
            id,
            name: product.name.clone(),
            price,
            quantity,
            current_stock: product.current_stock,
            image_url: product.image_url().map(str::to_owned),
        }
    }

    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }

    /// Whether the line satisfies `1 <= quantity <= current_stock`.
    #[must_use]
    pub const fn is_within_stock(&self) -> bool {
        self.quantity >= 1 && self.quantity <= self.current_stock
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(quantity: u32, current_stock: u32) -> CartLine {
        CartLine {
            id: ProductId::from(1_u32),
            name: "Keyboard".to_string(),
            price: Price::new(12.5).unwrap(),
            quantity,
            current_stock,
            image_url: None,
        }
    }

    #[test]
    fn test_line_total() {
        assert!((line(4, 10).line_total().amount() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_is_within_stock() {
        assert!(line(1, 1).is_within_stock());
        assert!(!line(0, 5).is_within_stock());
        assert!(!line(6, 5).is_within_stock());
    }

    #[test]
    fn test_persisted_field_names() {
        let json = serde_json::to_value(line(2, 3)).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["current_stock"], 3);
        assert!(json["image_url"].is_null());
    }

    #[test]
    fn test_reads_numeric_ids_from_older_data() {
        let json = r#"{"id": 1, "name": "Keyboard", "price": 12.5, "quantity": 2, "current_stock": 3}"#;
        let parsed: CartLine = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, line(2, 3));
    }
}
