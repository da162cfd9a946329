//! Integration tests for file-backed cart persistence.

use std::time::Duration;

use gomarketplace_cart::{CartStorage, HydrationReport, PersistenceMode, use_cart};
use gomarketplace_core::{CartState, NewCartItem, Price, ProductId};
use gomarketplace_integration_tests::{TestCart, product};

async fn stored(cart: &TestCart) -> Option<CartState> {
    let blob = cart.storage().get(&cart.config.storage_key).await.unwrap()?;
    Some(CartState::from_json(&blob).unwrap())
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[tokio::test]
async fn test_restart_restores_cart() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    cart.provider.hydrated().await;
    let handle = use_cart(&cart.provider.scope()).unwrap();

    handle.add_to_cart(product("p1", "Shirt", 1000)).persist.wait().await.unwrap();
    handle.add_to_cart(product("p2", "Mug", 450)).persist.wait().await.unwrap();
    handle.increment(&ProductId::new("p2")).persist.wait().await.unwrap();
    let original = handle.state();

    let restarted = cart.remount();
    assert_eq!(
        restarted.provider.hydrated().await,
        HydrationReport::Restored { items: 2, skipped: 0 }
    );
    let restored = use_cart(&restarted.provider.scope()).unwrap().state();
    assert_eq!(restored, original);
}

#[tokio::test]
async fn test_blob_written_by_legacy_client_loads() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    cart.provider.hydrated().await;
    cart.storage()
        .set(
            &cart.config.storage_key,
            r#"[{"id":"1","title":"Caneca","image_url":"https://x/1.png","price":19.9,"quantity":4}]"#
                .to_string(),
        )
        .await
        .unwrap();

    let restarted = cart.remount();
    restarted.provider.hydrated().await;
    let handle = use_cart(&restarted.provider.scope()).unwrap();
    assert_eq!(handle.item_count(), 4);
    assert_eq!(handle.items()[0].title, "Caneca");
}

#[tokio::test]
async fn test_restart_keeps_high_precision_price() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    cart.provider.hydrated().await;
    let handle = use_cart(&cart.provider.scope()).unwrap();

    let price = Price::new("19.123456789012345678".parse().unwrap());
    handle
        .add_to_cart(NewCartItem::new("p1", "Shirt", "u", price))
        .persist
        .wait()
        .await
        .unwrap();
    let original = handle.state();

    let restarted = cart.remount();
    restarted.provider.hydrated().await;
    let restored = use_cart(&restarted.provider.scope()).unwrap().state();
    assert_eq!(restored, original);
    assert_eq!(restored.items()[0].price, price);
}

#[tokio::test]
async fn test_unreadable_line_does_not_discard_cart() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    cart.provider.hydrated().await;
    cart.storage()
        .set(
            &cart.config.storage_key,
            r#"[
                {"id":"p1","title":"Shirt","image_url":"u","price":10,"quantity":2},
                {"id":"p2","title":"Yacht","image_url":"y","price":1e30,"quantity":1}
            ]"#
            .to_string(),
        )
        .await
        .unwrap();

    let restarted = cart.remount();
    assert_eq!(
        restarted.provider.hydrated().await,
        HydrationReport::Restored { items: 1, skipped: 1 }
    );
    let handle = use_cart(&restarted.provider.scope()).unwrap();
    handle.increment(&ProductId::new("p1")).persist.wait().await.unwrap();

    let saved = stored(&restarted).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved.item_count(), 3);
}

#[tokio::test]
async fn test_corrupt_blob_starts_empty() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    cart.provider.hydrated().await;
    cart.storage()
        .set(&cart.config.storage_key, "[{\"id\":".to_string())
        .await
        .unwrap();

    let restarted = cart.remount();
    assert_eq!(restarted.provider.hydrated().await, HydrationReport::Failed);
    assert!(use_cart(&restarted.provider.scope()).unwrap().items().is_empty());
}

// =============================================================================
// Persistence Lag Tests
// =============================================================================

/// Write A, mutate to B, read storage: next-state mode stores B.
#[tokio::test]
async fn test_next_state_mode_stores_latest() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    cart.provider.hydrated().await;
    let handle = use_cart(&cart.provider.scope()).unwrap();

    handle.add_to_cart(product("p1", "Shirt", 1000)).persist.wait().await.unwrap();
    handle.increment(&ProductId::new("p1")).persist.wait().await.unwrap();
    let state_b = handle.state();

    assert_eq!(stored(&cart).await, Some(state_b));
}

/// Write A, mutate to B, read storage: snapshot mode still stores A.
#[tokio::test]
async fn test_snapshot_mode_stores_previous() {
    let cart = TestCart::mount(PersistenceMode::Snapshot);
    cart.provider.hydrated().await;
    let handle = use_cart(&cart.provider.scope()).unwrap();

    handle.add_to_cart(product("p1", "Shirt", 1000)).persist.wait().await.unwrap();
    let state_a = handle.state();
    handle.increment(&ProductId::new("p1")).persist.wait().await.unwrap();

    assert_ne!(handle.state(), state_a);
    assert_eq!(stored(&cart).await, Some(state_a));
}

#[tokio::test]
async fn test_dropped_persist_task_still_writes() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    cart.provider.hydrated().await;
    let handle = use_cart(&cart.provider.scope()).unwrap();

    drop(handle.add_to_cart(product("p1", "Shirt", 1000)));

    let mut written = None;
    for _ in 0..100 {
        written = stored(&cart).await;
        if written.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(written, Some(handle.state()));
}
