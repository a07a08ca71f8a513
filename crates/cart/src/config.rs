//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `TIENDA_CART_DIR` - Directory backing file storage (default: .tienda)
//! - `TIENDA_CART_KEY` - Storage key holding the cart (default: `shopping_cart`);
//!   must not be one of the session keys

use std::path::PathBuf;

use thiserror::Error;

use crate::store::{DEFAULT_CART_KEY, validate_cart_key};

const DEFAULT_CART_DIR: &str = ".tienda";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Directory for file-backed storage
    pub storage_dir: PathBuf,
    /// Key the cart is persisted under
    pub cart_key: String,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_CART_DIR),
            cart_key: DEFAULT_CART_KEY.to_string(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_dir = get_or_default(&lookup, "TIENDA_CART_DIR", DEFAULT_CART_DIR);
        if storage_dir.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "TIENDA_CART_DIR".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let cart_key = get_or_default(&lookup, "TIENDA_CART_KEY", DEFAULT_CART_KEY);
        validate_cart_key(&cart_key).map_err(|e| {
            ConfigError::InvalidEnvVar("TIENDA_CART_KEY".to_string(), e.to_string())
        })?;

        Ok(Self {
            storage_dir: PathBuf::from(storage_dir),
            cart_key,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value.
fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}
