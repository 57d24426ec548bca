//! Unified error handling.
//!
//! Each module has its own error enum; `AppError` collects them for callers
//! that drive the whole storefront, such as the CLI.

use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::CatalogError;
use crate::checkout::SubmitError;
use crate::config::ConfigError;
use crate::navigation::RouteError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog could not be loaded.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Key-value store could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Order submission did not produce an order.
    #[error("Checkout error: {0}")]
    Checkout(#[from] SubmitError),

    /// Page location could not be resolved.
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    /// Product id not in the catalog.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Whether this error points at a fault in the system rather than at
    /// the shopper's input. Faults are worth reporting to Sentry.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        match self {
            Self::Config(_) | Self::Catalog(_) | Self::Storage(_) => true,
            Self::Cart(err) | Self::Checkout(SubmitError::Cart(err)) => {
                !matches!(err, CartError::InvalidQuantity(_))
            }
            Self::Checkout(err) => {
                matches!(err, SubmitError::TimedOut { .. } | SubmitError::Unavailable { .. })
            }
            Self::Route(_) | Self::NotFound(_) => false,
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faults_vs_user_errors() {
        let storage = StorageError::Unavailable("lock poisoned".to_owned());
        assert!(AppError::from(CartError::from(storage)).is_fault());
        assert!(!AppError::from(CartError::InvalidQuantity(0)).is_fault());
        assert!(!AppError::from(SubmitError::EmptyCart).is_fault());
        assert!(!AppError::from(SubmitError::InFlight).is_fault());
        assert!(!AppError::NotFound("product 9".to_owned()).is_fault());
    }

    #[test]
    fn test_gateway_outage_is_a_fault_but_decline_is_not() {
        let reference = crate::checkout::OrderReference::generate();
        let outage = SubmitError::Unavailable {
            reference: reference.clone(),
            reason: "payment service unavailable: timeout".to_owned(),
        };
        let decline = SubmitError::Declined {
            reference,
            reason: "The bank declined the payment.".to_owned(),
        };
        assert!(AppError::from(outage).is_fault());
        assert!(!AppError::from(decline).is_fault());
    }

    #[test]
    fn test_display_wraps_source() {
        let err = AppError::from(SubmitError::EmptyCart);
        assert_eq!(err.to_string(), "Checkout error: cart is empty");
    }
}
