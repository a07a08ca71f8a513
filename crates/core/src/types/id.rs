//! Newtype IDs with a canonical string form.
//!
//! Identifiers reach the client from several sources: JSON numbers from the
//! product API, strings from form inputs, and whatever an older build wrote to
//! local storage. Every id is normalized to one canonical string at the
//! boundary, so `7`, `"7"`, `7.0` and `" 7 "` all compare equal.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

use core::fmt;

use serde::de::{self, Visitor};

/// Largest integer an `f64` represents exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Errors that can occur when normalizing an identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input is empty or only whitespace.
    #[error("id cannot be empty")]
    Empty,
    /// The input is a NaN or infinite number.
    #[error("id must be a finite number")]
    NonFinite,
}

/// Normalize a textual id: surrounding whitespace is dropped.
///
/// # Errors
///
/// Returns [`IdError::Empty`] if nothing remains after trimming.
pub fn canonical_text(raw: &str) -> Result<String, IdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty);
    }
    Ok(trimmed.to_owned())
}

/// Normalize a numeric id to its decimal text.
///
/// Integral values render without a fractional part (`7.0` becomes `"7"`).
///
/// # Errors
///
/// Returns [`IdError::NonFinite`] for NaN and infinities.
pub fn canonical_number(value: f64) -> Result<String, IdError> {
    if !value.is_finite() {
        return Err(IdError::NonFinite);
    }
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        #[allow(clippy::cast_possible_truncation)]
        let integral = value as i64;
        return Ok(integral.to_string());
    }
    Ok(value.to_string())
}

/// Serde visitor accepting either a JSON string or a JSON number.
///
/// Used by the `Deserialize` impls generated by [`define_id!`].
pub struct CanonicalIdVisitor;

impl Visitor<'_> for CanonicalIdVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-empty string or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        canonical_text(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        canonical_number(v).map_err(E::custom)
    }
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around a canonical `String` with:
/// - `Serialize` as a plain JSON string
/// - `Deserialize` from a JSON string or number (normalized)
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `parse()`, `as_str()`, `into_inner()`
/// - `FromStr`, `Display`, `AsRef<str>` and integer `From` implementations
///
/// # Example
///
/// ```rust
/// # use tienda_core::define_id;
/// define_id!(SkuId);
/// define_id!(OrderId);
///
/// let sku = SkuId::parse("42").unwrap();
/// assert_eq!(sku, SkuId::from(42_u32));
///
/// // These are different types, so this won't compile:
/// // let _: SkuId = OrderId::from(42_u32);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an ID from text, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns an error if the text is empty after trimming.
            pub fn parse(raw: &str) -> ::core::result::Result<Self, $crate::IdError> {
                $crate::types::id::canonical_text(raw).map(Self)
            }

            /// Create an ID from a numeric value.
            ///
            /// # Errors
            ///
            /// Returns an error if the value is NaN or infinite.
            pub fn from_number(value: f64) -> ::core::result::Result<Self, $crate::IdError> {
                $crate::types::id::canonical_number(value).map(Self)
            }

            /// Get the canonical string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return its canonical string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id.to_string())
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id.to_string())
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id.to_string())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                deserializer
                    .deserialize_any($crate::types::id::CanonicalIdVisitor)
                    .map(Self)
            }
        }
    };
}

// Define standard entity IDs
define_id!(ProductId);
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let id = ProductId::parse("  p1 ").unwrap();
        assert_eq!(id.as_str(), "p1");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ProductId::parse(""), Err(IdError::Empty));
        assert_eq!(ProductId::parse("   "), Err(IdError::Empty));
    }

    #[test]
    fn test_numeric_and_string_ids_are_equal() {
        let from_text = ProductId::parse("7").unwrap();
        assert_eq!(from_text, ProductId::from(7_u32));
        assert_eq!(from_text, ProductId::from_number(7.0).unwrap());
    }

    #[test]
    fn test_fractional_number_keeps_fraction() {
        assert_eq!(ProductId::from_number(1.5).unwrap().as_str(), "1.5");
    }

    #[test]
    fn test_non_finite_number_rejected() {
        assert_eq!(ProductId::from_number(f64::NAN), Err(IdError::NonFinite));
        assert_eq!(
            ProductId::from_number(f64::INFINITY),
            Err(IdError::NonFinite)
        );
    }

    #[test]
    fn test_deserialize_accepts_number_and_string() {
        let ids: Vec<ProductId> = serde_json::from_str(r#"[12, "12", 12.0, " 12"]"#).unwrap();
        assert!(ids.iter().all(|id| id.as_str() == "12"));
    }

    #[test]
    fn test_deserialize_rejects_empty_string() {
        assert!(serde_json::from_str::<ProductId>(r#""""#).is_err());
    }

    #[test]
    fn test_deserialize_rejects_other_types() {
        assert!(serde_json::from_str::<ProductId>("true").is_err());
        assert!(serde_json::from_str::<ProductId>("{}").is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let id = ProductId::from(42_u32);
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""42""#);
    }

    #[test]
    fn test_display() {
        let id = UserId::parse("b7f0c2").unwrap();
        assert_eq!(format!("{id}"), "b7f0c2");
    }
}
