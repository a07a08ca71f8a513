//! Integration tests for persisted cart state.
//!
//! Covers file storage across reloads, malformed entries, the persisted
//! layout, and several stores sharing one storage origin.
//!
//! Run with: cargo test -p tienda-integration-tests

use std::sync::Arc;

use serde_json::{Value, json};

use tienda_cart::store::DEFAULT_CART_KEY;
use tienda_cart::view::{CartBadge, CartViewModel};
use tienda_cart::{CartStorage, CartStore, FileStorage, MemoryStorage};
use tienda_core::{ProductId, ProductSnapshot};
use tienda_integration_tests::{Recorder, pid, product};

// ============================================================================
// File Storage
// ============================================================================

#[test]
fn test_cart_survives_reload() {
    let dir = tempfile::tempdir().expect("temp dir");

    {
        let store = CartStore::new(FileStorage::open(dir.path()).expect("open storage"));
        store
            .add(&product("p1", 10.0, 5).with_image_url("https://img/p1.png"), 2)
            .expect("add p1");
        store.add(&product("p2", 4.25, 3), 1).expect("add p2");
    }

    let reloaded = CartStore::new(FileStorage::open(dir.path()).expect("reopen storage"));
    let lines = reloaded.read();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].id, pid("p1"));
    assert_eq!(lines[0].quantity, 2);
    assert_eq!(lines[0].image_url.as_deref(), Some("https://img/p1.png"));
    assert_eq!(lines[1].id, pid("p2"));
    assert!((reloaded.total() - 24.25).abs() < 1e-9);
}

#[test]
fn test_clear_removes_file_entry() {
    let dir = tempfile::tempdir().expect("temp dir");
    let storage = FileStorage::open(dir.path()).expect("open storage");
    let store = CartStore::new(storage.clone());

    store.add(&product("p1", 10.0, 5), 1).expect("add");
    assert!(storage.get(DEFAULT_CART_KEY).expect("get").is_some());

    store.clear().expect("clear");
    assert!(storage.get(DEFAULT_CART_KEY).expect("get").is_none());
}

#[test]
fn test_custom_key_is_isolated() {
    let storage = MemoryStorage::new();
    let main = CartStore::new(storage.clone());
    let wishlist = CartStore::with_key(storage, "wishlist").expect("valid key");

    wishlist.add(&product("p1", 10.0, 5), 1).expect("add");
    assert!(main.read().is_empty());
    assert_eq!(wishlist.item_count(), 1);
}

#[test]
fn test_invalid_key_rejected() {
    assert!(CartStore::with_key(MemoryStorage::new(), "../cart").is_err());
}

// ============================================================================
// Persisted Layout
// ============================================================================

#[test]
fn test_persisted_layout() {
    let storage = MemoryStorage::new();
    let store = CartStore::new(storage.clone());
    store.add(&product("p1", 10.0, 5), 2).expect("add");

    let raw = storage
        .get(DEFAULT_CART_KEY)
        .expect("get")
        .expect("cart entry present");
    let value: Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(
        value,
        json!([{
            "id": "p1",
            "name": "Product p1",
            "price": 10.0,
            "quantity": 2,
            "current_stock": 5,
            "image_url": null
        }])
    );
}

#[test]
fn test_numeric_ids_in_persisted_state() {
    let storage = MemoryStorage::new();
    storage
        .set(
            DEFAULT_CART_KEY,
            r#"[{"id": 7, "name": "Mug", "price": 3.5, "quantity": 1, "current_stock": 4}]"#,
        )
        .expect("seed");
    let store = CartStore::new(storage);

    store.increment(&pid("7")).expect("string id finds numeric line");
    store
        .add(&ProductSnapshot::new(ProductId::from(7_u32), "Mug", 3.5, 4), 1)
        .expect("numeric id finds the same line");
    assert_eq!(store.line_count(), 1);
    assert_eq!(store.item_count(), 3);
}

#[test]
fn test_listing_json_becomes_snapshot() {
    let listing = json!({
        "id": 31,
        "name": "Notebook",
        "price": "2.75",
        "stock": 6,
        "stock_minimo": 2,
        "image_url": ""
    });
    let snapshot: ProductSnapshot = serde_json::from_value(listing).expect("listing");
    assert_eq!(snapshot.id, Some(ProductId::from(31_u32)));
    assert_eq!(snapshot.current_stock, 6);
    assert!(snapshot.image_url().is_none());

    let store = CartStore::new(MemoryStorage::new());
    store.add(&snapshot, 2).expect("add listing product");
    assert!((store.total() - 5.5).abs() < 1e-9);
}

// ============================================================================
// Malformed State
// ============================================================================

#[test]
fn test_malformed_entry_reads_empty_and_is_overwritten() {
    let storage = MemoryStorage::new();
    storage.set(DEFAULT_CART_KEY, "not json at all").expect("seed");
    let store = CartStore::new(storage.clone());

    assert!(store.read().is_empty());
    assert_eq!(store.item_count(), 0);

    store.add(&product("p1", 10.0, 5), 1).expect("add over malformed");
    let raw = storage.get(DEFAULT_CART_KEY).expect("get").expect("entry");
    let value: Value = serde_json::from_str(&raw).expect("valid json now");
    assert_eq!(value.as_array().map(Vec::len), Some(1));
}

#[test]
fn test_wrong_shape_reads_empty() {
    let storage = MemoryStorage::new();
    storage
        .set(DEFAULT_CART_KEY, r#"{"items": [{"id": "p1"}]}"#)
        .expect("seed");
    assert!(CartStore::new(storage).read().is_empty());
}

#[test]
fn test_one_bad_line_does_not_empty_the_cart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let storage = FileStorage::open(dir.path()).expect("open storage");
    storage
        .set(
            DEFAULT_CART_KEY,
            &json!([
                {"id": "p1", "name": "A", "price": 10.0, "quantity": 2, "current_stock": 5},
                {"id": "p2", "name": "B", "price": "free", "quantity": 1, "current_stock": 5},
                {"id": "p3", "name": "C", "price": 1.5, "quantity": 1, "current_stock": 5}
            ])
            .to_string(),
        )
        .expect("seed");
    let store = CartStore::new(storage);

    let lines = store.read();
    let ids: Vec<_> = lines.iter().map(|line| line.id.as_str()).collect();
    assert_eq!(ids, ["p1", "p3"]);
    assert_eq!(store.item_count(), 3);
    assert!((store.total() - 21.5).abs() < 1e-9);
}

#[test]
fn test_out_of_range_lines_are_repaired() {
    let storage = MemoryStorage::new();
    storage
        .set(
            DEFAULT_CART_KEY,
            &json!([
                {"id": "p1", "name": "A", "price": 1.0, "quantity": 9, "current_stock": 3},
                {"id": "p2", "name": "B", "price": 1.0, "quantity": 0, "current_stock": 3},
                {"id": "p3", "name": "C", "price": 1.0, "quantity": 1, "current_stock": 0}
            ])
            .to_string(),
        )
        .expect("seed");
    let store = CartStore::new(storage);

    let lines = store.read();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].id, pid("p1"));
    assert_eq!(lines[0].quantity, 3);
}

// ============================================================================
// Several Stores Per Origin
// ============================================================================

#[test]
fn test_second_store_is_not_notified_but_reads_fresh_state() {
    let storage = MemoryStorage::new();
    let page_a = CartStore::new(storage.clone());
    let page_b = CartStore::new(storage);
    let seen_by_a = Recorder::attach(&page_a);
    let seen_by_b = Recorder::attach(&page_b);

    page_a.add(&product("p1", 10.0, 5), 2).expect("add on page a");

    assert_eq!(seen_by_a.len(), 1);
    assert!(seen_by_b.is_empty(), "notifications are per store");
    assert_eq!(page_b.item_count(), 2, "reads see the shared storage");
}

#[test]
fn test_view_model_is_stale_until_its_own_store_changes() {
    let storage = MemoryStorage::new();
    let page_a = CartStore::new(storage.clone());
    let page_b = Arc::new(CartStore::new(storage));
    let model_b = CartViewModel::attach(&page_b);

    page_a.add(&product("p1", 10.0, 5), 2).expect("add on page a");
    assert!(model_b.current().is_empty(), "page b has not been told");
    assert_eq!(CartBadge::from_store(&page_b).count, 2);

    page_b.increment(&pid("p1")).expect("increment on page b");
    let view = model_b.current();
    assert_eq!(view.item_count, 3);
    assert_eq!(view.total, "$30.00");
}
