//! Cart snapshots across stores, reloads and a file-backed store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use woala_core::{Price, ProductId};
use woala_integration_tests::{Harness, catalog, sample_catalog_source, temp_store};
use woala_storefront::cart::{DEFAULT_CART_KEY, MAX_LINE_QUANTITY};
use woala_storefront::storage::{KeyValueStore, MemoryStore};
use woala_storefront::{AddOutcome, CartStore, Catalog};

#[test]
fn test_repeated_adds_accumulate_on_one_line() {
    let h = Harness::in_memory().unwrap();
    let adds = [1, 2, 3];
    for quantity in adds {
        h.shop.add_to_cart(ProductId::new(2), quantity).unwrap();
    }

    let cart = h.shop.cart().snapshot().unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.get(ProductId::new(2)).unwrap().quantity, adds.iter().sum::<u32>());
}

#[test]
fn test_accumulation_clamps_at_max() {
    let h = Harness::in_memory().unwrap();
    h.shop.add_to_cart(ProductId::new(1), 7).unwrap();
    let outcome = h.shop.add_to_cart(ProductId::new(1), 7).unwrap();

    assert_eq!(
        outcome,
        AddOutcome::Added {
            added: 3,
            line_quantity: MAX_LINE_QUANTITY,
            item_count: MAX_LINE_QUANTITY,
        }
    );
}

#[test]
fn test_second_store_sees_every_write() {
    let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let first = Harness::over(storage.clone()).unwrap();
    let second = Harness::over(storage).unwrap();

    first.shop.add_to_cart(ProductId::new(1), 2).unwrap();
    assert_eq!(second.shop.item_count().unwrap(), 2);

    second.shop.cart().remove_item(ProductId::new(1)).unwrap();
    assert_eq!(first.shop.item_count().unwrap(), 0);
}

#[test]
fn test_reload_reproduces_ordered_lines() {
    let storage: Arc<dyn KeyValueStore> = Arc::new(temp_store().unwrap());
    let before = {
        let h = Harness::over(storage.clone()).unwrap();
        h.shop.add_to_cart(ProductId::new(2), 3).unwrap();
        h.shop.add_to_cart(ProductId::new(1), 1).unwrap();
        h.shop.cart().snapshot().unwrap()
    };

    let reloaded = Harness::over(storage).unwrap();
    let after = reloaded.shop.cart().snapshot().unwrap();
    assert_eq!(after, before);

    let ids: Vec<_> = after.iter().map(|item| item.product_id).collect();
    assert_eq!(ids, vec![ProductId::new(2), ProductId::new(1)]);
}

#[test]
fn test_temp_store_cleans_up() {
    let store = temp_store().unwrap();
    store.set(DEFAULT_CART_KEY, "[]").unwrap();
    let dir = store.dir().to_path_buf();
    assert!(dir.exists());

    drop(store);
    assert!(!dir.exists());
}

#[test]
fn test_snapshot_uses_storefront_layout() {
    let storage = Arc::new(MemoryStore::new());
    let store = CartStore::new(storage.clone(), catalog().unwrap());
    store.add_item(ProductId::new(2), 2).unwrap();

    let raw = storage.get(DEFAULT_CART_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let line = &json[0];
    assert_eq!(line["id"], 2);
    assert_eq!(line["name"], "Notebook");
    assert_eq!(line["image"], "images/notebook.jpg");
    assert_eq!(line["quantity"], 2);
    assert_eq!(
        line["price"].as_str().unwrap().parse::<rust_decimal::Decimal>().unwrap(),
        Price::from_cents(2_550).amount()
    );
}

#[test]
fn test_corrupt_snapshot_reads_as_empty_and_is_replaced() {
    let storage = Arc::new(MemoryStore::new());
    storage.set(DEFAULT_CART_KEY, "{not json").unwrap();
    let store = CartStore::new(storage.clone(), catalog().unwrap());

    assert!(store.snapshot().unwrap().is_empty());
    store.add_item(ProductId::new(1), 1).unwrap();
    assert_eq!(store.total_item_count().unwrap(), 1);
}

#[tokio::test]
async fn test_sample_catalog_loads() {
    let catalog = Catalog::load(&sample_catalog_source()).await.unwrap();
    assert!(!catalog.is_empty());
}
