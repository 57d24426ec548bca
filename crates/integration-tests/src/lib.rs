//! Integration tests for the Woala storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p woala-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - Cart snapshots across stores and reloads
//! - `pricing` - Order summaries for known carts
//! - `checkout_flow` - Form validation and order submission end to end
//!
//! This crate holds the shared fixtures.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use woala_storefront::catalog::ProductLookup;
use woala_storefront::navigation::RecordingNavigator;
use woala_storefront::notify::RecordingNotifier;
use woala_storefront::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
use woala_storefront::validation::FieldName;
use woala_storefront::{Catalog, CatalogError, CatalogSource, CartStore, CheckoutForm, Shop};

/// Catalog used by every scenario.
pub const CATALOG_JSON: &str = r#"[
    {"id": 1, "name": "Desk Lamp", "price": "100.00", "originalPrice": "120.00",
     "image": "images/lamp.jpg", "rating": 4.5, "reviews": 12, "inStock": true},
    {"id": 2, "name": "Notebook", "price": "25.50", "originalPrice": "25.50",
     "image": "images/notebook.jpg", "rating": 4, "reviews": 3, "inStock": true},
    {"id": 3, "name": "Fountain Pen", "price": "60.00", "originalPrice": "80.00",
     "image": "images/pen.jpg", "rating": 3.5, "reviews": 7, "inStock": false}
]"#;

/// Fixed "today" for card expiry checks.
#[must_use]
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap_or_default()
}

/// Parse [`CATALOG_JSON`].
///
/// # Errors
///
/// Returns `CatalogError` if the fixture does not parse.
pub fn catalog() -> Result<Arc<dyn ProductLookup>, CatalogError> {
    Ok(Arc::new(Catalog::from_json(CATALOG_JSON)?))
}

/// Path of the sample catalog shipped with the repository.
#[must_use]
pub fn sample_catalog_source() -> CatalogSource {
    CatalogSource::File(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/products.json"))
}

/// A file-backed store in its own temporary directory, removed on drop.
#[derive(Debug)]
pub struct TempStore {
    store: FileStore,
}

impl TempStore {
    /// Directory holding the key files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.store.dir()
    }
}

impl KeyValueStore for TempStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.store.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.store.set(key, value)
    }
}

impl Drop for TempStore {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(self.store.dir());
    }
}

/// A fresh temporary directory for a file-backed store.
///
/// # Errors
///
/// Returns `StorageError` if the directory cannot be created.
pub fn temp_store() -> Result<TempStore, StorageError> {
    let dir = std::env::temp_dir().join(format!("woala-it-{}", uuid::Uuid::new_v4()));
    Ok(TempStore {
        store: FileStore::open(dir)?,
    })
}

/// A shop wired to recording collaborators.
pub struct Harness {
    pub shop: Shop,
    pub storage: Arc<dyn KeyValueStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    /// Harness over a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the fixture catalog does not parse.
    pub fn in_memory() -> Result<Self, CatalogError> {
        Self::over(Arc::new(MemoryStore::new()))
    }

    /// Harness over an existing store, e.g. to simulate a page reload.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the fixture catalog does not parse.
    pub fn over(storage: Arc<dyn KeyValueStore>) -> Result<Self, CatalogError> {
        let catalog = catalog()?;
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let cart = CartStore::new(storage.clone(), catalog.clone());
        let shop = Shop::new(catalog, cart, notifier.clone(), navigator.clone());
        Ok(Self {
            shop,
            storage,
            notifier,
            navigator,
        })
    }
}

/// A checkout form with valid contact and card details.
#[must_use]
pub fn valid_form() -> CheckoutForm {
    let mut form = CheckoutForm::new();
    for (field, value) in [
        (FieldName::FirstName, "Ada"),
        (FieldName::LastName, "Lovelace"),
        (FieldName::Email, "ada@example.com"),
        (FieldName::Phone, "5550000000"),
        (FieldName::Address, "1 Analytical St"),
        (FieldName::City, "Izmir"),
        (FieldName::PostalCode, "35000"),
        (FieldName::CardNumber, "4111 1111 1111 1111"),
        (FieldName::CardName, "ADA LOVELACE"),
        (FieldName::ExpiryDate, "12/30"),
        (FieldName::Cvv, "123"),
    ] {
        form.input(field, value);
    }
    form
}
