//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional.
//! - `WOALA_TAX_RATE` - Tax as a fraction of the subtotal (default: 0.08)
//! - `WOALA_SHIPPING_FLAT` - Flat shipping charge per order (default: 9.99)
//! - `WOALA_CART_KEY` - Storage key of the cart snapshot (default: cart)
//! - `WOALA_SUBMIT_TIMEOUT_SECS` - Order submission timeout (default: 30)
//! - `WOALA_CATALOG` - Catalog file path or http(s) URL (default: data/products.json)
//! - `WOALA_DATA_DIR` - Directory for the file-backed cart store (default: .woala)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use woala_core::Price;

use crate::cart::DEFAULT_CART_KEY;
use crate::catalog::CatalogSource;
use crate::checkout::DEFAULT_SUBMIT_TIMEOUT;
use crate::pricing::Rates;
use crate::storage;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Tax rate and flat shipping
    pub rates: Rates,
    /// Storage key of the cart snapshot
    pub cart_key: String,
    /// How long an order submission may take
    pub submit_timeout: Duration,
    /// Where the product catalog is loaded from
    pub catalog: CatalogSource,
    /// Directory of the file-backed key-value store
    pub data_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            rates: Rates::default(),
            cart_key: DEFAULT_CART_KEY.to_string(),
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            catalog: CatalogSource::File(PathBuf::from("data/products.json")),
            data_dir: PathBuf::from(".woala"),
            sentry_dsn: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let tax_rate = env.non_negative_decimal("WOALA_TAX_RATE", "0.08")?;
        let shipping_flat = env.non_negative_decimal("WOALA_SHIPPING_FLAT", "9.99")?;

        let cart_key = env.or_default("WOALA_CART_KEY", DEFAULT_CART_KEY);
        if !storage::is_valid_key(&cart_key) {
            return Err(invalid(
                "WOALA_CART_KEY",
                "only letters, digits, '-' and '_' are allowed",
            ));
        }

        let timeout_secs = env
            .or_default("WOALA_SUBMIT_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| invalid("WOALA_SUBMIT_TIMEOUT_SECS", e))?;
        if timeout_secs == 0 {
            return Err(invalid("WOALA_SUBMIT_TIMEOUT_SECS", "must be at least 1"));
        }

        let catalog = env
            .or_default("WOALA_CATALOG", "data/products.json")
            .parse::<CatalogSource>()
            .map_err(|e| invalid("WOALA_CATALOG", e))?;

        Ok(Self {
            rates: Rates {
                tax_rate,
                shipping_flat: Price::new(shipping_flat),
            },
            cart_key,
            submit_timeout: Duration::from_secs(timeout_secs),
            catalog,
            data_dir: PathBuf::from(env.or_default("WOALA_DATA_DIR", ".woala")),
            sentry_dsn: env.optional("SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable. Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn non_negative_decimal(&self, key: &str, default: &str) -> Result<Decimal, ConfigError> {
        let value = self
            .or_default(key, default)
            .trim()
            .parse::<Decimal>()
            .map_err(|e| invalid(key, e))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(invalid(key, "must not be negative"));
        }
        Ok(value)
    }
}

fn invalid(key: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), reason.to_string())
}
