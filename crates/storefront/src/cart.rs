//! Cart store.
//!
//! The persisted snapshot is the single source of truth. Every operation
//! reads it, and every mutation writes the full snapshot back before
//! returning, so two stores over the same [`KeyValueStore`] (two views,
//! a reload) always agree on their next read.
//!
//! # Quantity policy
//!
//! A line holds between [`MIN_LINE_QUANTITY`] and [`MAX_LINE_QUANTITY`]
//! units. Repeated adds accumulate and are clamped at the maximum; the
//! returned [`AddOutcome`] says how many units were actually added.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use woala_core::{Price, ProductId};

use crate::catalog::{Product, ProductLookup};
use crate::storage::{KeyValueStore, StorageError};

/// Storage key the cart snapshot lives under.
pub const DEFAULT_CART_KEY: &str = "cart";

/// Smallest quantity a line can hold.
pub const MIN_LINE_QUANTITY: u32 = 1;

/// Largest quantity a line can hold.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Reading or writing the snapshot failed.
    #[error("cart storage error: {0}")]
    Storage(#[from] StorageError),

    /// The snapshot could not be serialized.
    #[error("cart serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Adding zero units is not a meaningful request.
    #[error("quantity must be at least {MIN_LINE_QUANTITY}, got {0}")]
    InvalidQuantity(u32),
}

/// One product/quantity line in the cart.
///
/// Field names on the wire match the storefront's local-storage layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: Price,
    pub image: String,
    pub quantity: u32,
}

impl CartItem {
    fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            image: product.image.clone(),
            quantity,
        }
    }

    /// Unit price times quantity, unrounded.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Read-only view of the cart at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Lines in first-added order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Iterate over lines in first-added order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line for a product, if present.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Consume the view and return its lines.
    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    /// Rebuild a cart from persisted lines, restoring the line invariants.
    ///
    /// Duplicate product lines are merged into the first one and quantities
    /// are clamped; a line persisted with quantity 0 is dropped.
    fn from_persisted(lines: Vec<CartItem>) -> Self {
        let mut items: Vec<CartItem> = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            if let Some(existing) = items.iter_mut().find(|i| i.product_id == line.product_id) {
                existing.quantity = existing
                    .quantity
                    .saturating_add(line.quantity)
                    .min(MAX_LINE_QUANTITY);
            } else {
                items.push(CartItem {
                    quantity: line.quantity.min(MAX_LINE_QUANTITY),
                    ..line
                });
            }
        }
        Self { items }
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Result of [`CartStore::add_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Units were added. `added` is less than requested when the line hit
    /// the maximum.
    Added {
        added: u32,
        line_quantity: u32,
        item_count: u32,
    },
    /// The line was already at the maximum; nothing changed.
    AtLimit { item_count: u32 },
    /// The product is unknown or out of stock; nothing changed.
    Unavailable { item_count: u32 },
}

impl AddOutcome {
    /// Cart badge count after the operation.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        match self {
            Self::Added { item_count, .. }
            | Self::AtLimit { item_count }
            | Self::Unavailable { item_count } => *item_count,
        }
    }
}

/// The cart, persisted write-through to a key-value store.
#[derive(Clone)]
pub struct CartStore {
    storage: Arc<dyn KeyValueStore>,
    catalog: Arc<dyn ProductLookup>,
    key: String,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store using the default cart key.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, catalog: Arc<dyn ProductLookup>) -> Self {
        Self::with_key(storage, catalog, DEFAULT_CART_KEY)
    }

    /// Create a store that persists under a custom key.
    #[must_use]
    pub fn with_key(
        storage: Arc<dyn KeyValueStore>,
        catalog: Arc<dyn ProductLookup>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            catalog,
            key: key.into(),
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// Unknown and out-of-stock products are a no-op. An existing line
    /// accumulates up to [`MAX_LINE_QUANTITY`].
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a zero quantity, or a
    /// storage error if the snapshot cannot be read or written.
    #[instrument(skip(self))]
    pub fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<AddOutcome, CartError> {
        if quantity < MIN_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let mut cart = self.load()?;

        let product = match self.catalog.get_product(product_id) {
            Some(product) if product.in_stock => product,
            Some(_) => {
                debug!("Product out of stock, not adding");
                return Ok(AddOutcome::Unavailable {
                    item_count: cart.total_quantity(),
                });
            }
            None => {
                debug!("Unknown product, not adding");
                return Ok(AddOutcome::Unavailable {
                    item_count: cart.total_quantity(),
                });
            }
        };

        let (added, line_quantity) =
            if let Some(existing) = cart.items.iter_mut().find(|i| i.product_id == product_id) {
                let target = existing
                    .quantity
                    .saturating_add(quantity)
                    .min(MAX_LINE_QUANTITY);
                let added = target - existing.quantity;
                existing.quantity = target;
                (added, target)
            } else {
                let line_quantity = quantity.min(MAX_LINE_QUANTITY);
                cart.items.push(CartItem::from_product(&product, line_quantity));
                (line_quantity, line_quantity)
            };

        if added == 0 {
            return Ok(AddOutcome::AtLimit {
                item_count: cart.total_quantity(),
            });
        }

        self.save(&cart)?;
        let item_count = cart.total_quantity();
        info!(added, line_quantity, item_count, "Added to cart");

        Ok(AddOutcome::Added {
            added,
            line_quantity,
            item_count,
        })
    }

    /// Set a line's quantity, clamped to 1..=10.
    ///
    /// Returns the stored quantity, or `None` (and writes nothing) if the
    /// product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the snapshot cannot be read or written.
    #[instrument(skip(self))]
    pub fn set_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Option<u32>, CartError> {
        let mut cart = self.load()?;
        let Some(line) = cart.items.iter_mut().find(|i| i.product_id == product_id) else {
            debug!("Product not in cart, ignoring quantity change");
            return Ok(None);
        };

        let clamped = quantity.clamp(MIN_LINE_QUANTITY, MAX_LINE_QUANTITY);
        line.quantity = clamped;
        self.save(&cart)?;
        info!(quantity = clamped, "Updated cart line");
        Ok(Some(clamped))
    }

    /// Take one unit off a line, removing the line when it would reach 0.
    ///
    /// Returns the remaining quantity (0 when the line was removed), or
    /// `None` if the product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the snapshot cannot be read or written.
    #[instrument(skip(self))]
    pub fn decrement_item(&self, product_id: ProductId) -> Result<Option<u32>, CartError> {
        let mut cart = self.load()?;
        let Some(index) = cart.items.iter().position(|i| i.product_id == product_id) else {
            return Ok(None);
        };

        let remaining = cart
            .items
            .get(index)
            .map_or(0, |line| line.quantity.saturating_sub(1));
        if remaining == 0 {
            cart.items.remove(index);
        } else if let Some(line) = cart.items.get_mut(index) {
            line.quantity = remaining;
        }

        self.save(&cart)?;
        info!(remaining, "Decremented cart line");
        Ok(Some(remaining))
    }

    /// Remove a product's line. Returns whether a line was removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the snapshot cannot be read or written.
    #[instrument(skip(self))]
    pub fn remove_item(&self, product_id: ProductId) -> Result<bool, CartError> {
        let mut cart = self.load()?;
        let before = cart.items.len();
        cart.items.retain(|i| i.product_id != product_id);

        if cart.items.len() == before {
            debug!("Product not in cart, nothing to remove");
            return Ok(false);
        }

        self.save(&cart)?;
        info!("Removed from cart");
        Ok(true)
    }

    /// Empty the cart and persist the empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the snapshot cannot be written.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), CartError> {
        self.save(&Cart::default())?;
        info!("Cleared cart");
        Ok(())
    }

    /// Sum of all quantities, recomputed from the persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the snapshot cannot be read.
    pub fn total_item_count(&self) -> Result<u32, CartError> {
        Ok(self.load()?.total_quantity())
    }

    /// Current cart contents.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the snapshot cannot be read.
    pub fn snapshot(&self) -> Result<Cart, CartError> {
        self.load()
    }

    fn load(&self) -> Result<Cart, CartError> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(Cart::default());
        };

        match serde_json::from_str::<Vec<CartItem>>(&raw) {
            Ok(lines) => Ok(Cart::from_persisted(lines)),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable cart snapshot");
                Ok(Cart::default())
            }
        }
    }

    fn save(&self, cart: &Cart) -> Result<(), CartError> {
        let json = serde_json::to_string(&cart.items)?;
        self.storage.set(&self.key, &json)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::Catalog;
    use crate::storage::MemoryStore;

    fn product(id: i32, cents: i64, in_stock: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::from_cents(cents),
            original_price: Price::from_cents(cents),
            image: format!("images/{id}.jpg"),
            rating: Decimal::from(4),
            reviews: 3,
            in_stock,
            images: Vec::new(),
            description: String::new(),
            features: Vec::new(),
        }
    }

    fn setup() -> (Arc<MemoryStore>, CartStore) {
        let catalog = Catalog::new(vec![
            product(1, 10_000, true),
            product(2, 2_550, true),
            product(3, 500, false),
        ])
        .unwrap();
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::new(storage.clone(), Arc::new(catalog));
        (storage, store)
    }

    #[test]
    fn test_add_new_item() {
        let (_, store) = setup();
        let outcome = store.add_item(ProductId::new(1), 2).unwrap();
        assert_eq!(
            outcome,
            AddOutcome::Added {
                added: 2,
                line_quantity: 2,
                item_count: 2
            }
        );

        let cart = store.snapshot().unwrap();
        let line = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(line.name, "Product 1");
        assert_eq!(line.unit_price, Price::from_cents(10_000));
        assert_eq!(line.image, "images/1.jpg");
    }

    #[test]
    fn test_repeat_add_accumulates_single_line() {
        let (_, store) = setup();
        for _ in 0..3 {
            store.add_item(ProductId::new(1), 1).unwrap();
        }
        store.add_item(ProductId::new(1), 2).unwrap();

        let cart = store.snapshot().unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 5);
    }

    #[test]
    fn test_add_clamps_at_max() {
        let (_, store) = setup();
        store.add_item(ProductId::new(1), 8).unwrap();
        let outcome = store.add_item(ProductId::new(1), 5).unwrap();
        assert_eq!(
            outcome,
            AddOutcome::Added {
                added: 2,
                line_quantity: 10,
                item_count: 10
            }
        );
    }

    #[test]
    fn test_add_single_call_over_max_is_clamped() {
        let (_, store) = setup();
        let outcome = store.add_item(ProductId::new(2), 25).unwrap();
        assert_eq!(outcome.item_count(), 10);
    }

    #[test]
    fn test_add_at_limit_does_not_write() {
        let (storage, store) = setup();
        store.add_item(ProductId::new(1), 10).unwrap();
        let writes = storage.write_count();

        let outcome = store.add_item(ProductId::new(1), 1).unwrap();
        assert_eq!(outcome, AddOutcome::AtLimit { item_count: 10 });
        assert_eq!(storage.write_count(), writes);
    }

    #[test]
    fn test_add_zero_rejected() {
        let (storage, store) = setup();
        assert!(matches!(
            store.add_item(ProductId::new(1), 0),
            Err(CartError::InvalidQuantity(0))
        ));
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn test_add_unknown_or_out_of_stock_is_noop() {
        let (storage, store) = setup();
        assert_eq!(
            store.add_item(ProductId::new(99), 1).unwrap(),
            AddOutcome::Unavailable { item_count: 0 }
        );
        assert_eq!(
            store.add_item(ProductId::new(3), 1).unwrap(),
            AddOutcome::Unavailable { item_count: 0 }
        );
        assert_eq!(storage.write_count(), 0);
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let (_, store) = setup();
        store.add_item(ProductId::new(2), 1).unwrap();
        store.add_item(ProductId::new(1), 1).unwrap();
        store.add_item(ProductId::new(2), 1).unwrap();

        let ids: Vec<_> = store
            .snapshot()
            .unwrap()
            .iter()
            .map(|i| i.product_id.as_i32())
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_set_quantity_clamps() {
        let (_, store) = setup();
        store.add_item(ProductId::new(1), 1).unwrap();

        assert_eq!(store.set_quantity(ProductId::new(1), 0).unwrap(), Some(1));
        assert_eq!(store.set_quantity(ProductId::new(1), 42).unwrap(), Some(10));
        assert_eq!(store.set_quantity(ProductId::new(1), 4).unwrap(), Some(4));
        assert_eq!(store.total_item_count().unwrap(), 4);
    }

    #[test]
    fn test_set_quantity_absent_is_noop() {
        let (storage, store) = setup();
        assert_eq!(store.set_quantity(ProductId::new(1), 3).unwrap(), None);
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn test_decrement_removes_at_zero() {
        let (_, store) = setup();
        store.add_item(ProductId::new(1), 2).unwrap();

        assert_eq!(store.decrement_item(ProductId::new(1)).unwrap(), Some(1));
        assert_eq!(store.decrement_item(ProductId::new(1)).unwrap(), Some(0));
        assert!(store.snapshot().unwrap().is_empty());
        assert_eq!(store.decrement_item(ProductId::new(1)).unwrap(), None);
    }

    #[test]
    fn test_remove_item() {
        let (storage, store) = setup();
        store.add_item(ProductId::new(1), 1).unwrap();
        store.add_item(ProductId::new(2), 1).unwrap();

        assert!(store.remove_item(ProductId::new(1)).unwrap());
        let writes = storage.write_count();
        assert!(!store.remove_item(ProductId::new(1)).unwrap());
        assert_eq!(storage.write_count(), writes);

        let cart = store.snapshot().unwrap();
        assert_eq!(cart.len(), 1);
        assert!(cart.get(ProductId::new(2)).is_some());
    }

    #[test]
    fn test_clear_persists_empty_snapshot() {
        let (storage, store) = setup();
        store.add_item(ProductId::new(1), 3).unwrap();
        store.clear().unwrap();

        assert_eq!(storage.get(DEFAULT_CART_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(store.total_item_count().unwrap(), 0);
    }

    #[test]
    fn test_second_store_sees_writes() {
        let (storage, first) = setup();
        let second = CartStore::new(storage, Arc::new(Catalog::default()));

        first.add_item(ProductId::new(1), 2).unwrap();
        assert_eq!(second.total_item_count().unwrap(), 2);

        second.remove_item(ProductId::new(1)).unwrap();
        assert_eq!(first.total_item_count().unwrap(), 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let (_, store) = setup();
        store.add_item(ProductId::new(1), 1).unwrap();
        let before = store.snapshot().unwrap();

        store.add_item(ProductId::new(1), 1).unwrap();
        assert_eq!(before.total_quantity(), 1);
        assert_eq!(store.snapshot().unwrap().total_quantity(), 2);
    }

    #[test]
    fn test_unreadable_snapshot_treated_as_empty() {
        let (storage, store) = setup();
        storage.set(DEFAULT_CART_KEY, "{corrupt").unwrap();

        assert_eq!(store.total_item_count().unwrap(), 0);
        store.add_item(ProductId::new(2), 1).unwrap();
        assert_eq!(store.total_item_count().unwrap(), 1);
    }

    #[test]
    fn test_persisted_snapshot_restores_invariants() {
        let (storage, store) = setup();
        storage
            .set(
                DEFAULT_CART_KEY,
                r#"[
                    {"id":1,"name":"A","price":"100","image":"a","quantity":7},
                    {"id":2,"name":"B","price":"25.50","image":"b","quantity":0},
                    {"id":1,"name":"A","price":"100","image":"a","quantity":7}
                ]"#,
            )
            .unwrap();

        let cart = store.snapshot().unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 10);
    }

    #[test]
    fn test_wire_format_uses_storefront_keys() {
        let (storage, store) = setup();
        store.add_item(ProductId::new(2), 1).unwrap();

        let raw = storage.get(DEFAULT_CART_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let line = &value[0];
        assert_eq!(line["id"], 2);
        assert_eq!(line["name"], "Product 2");
        assert_eq!(line["price"], "25.50");
        assert_eq!(line["quantity"], 1);
    }
}
