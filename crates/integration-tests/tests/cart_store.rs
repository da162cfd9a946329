//! Integration tests for cart operations through the provider scope.
//!
//! These tests drive the consumer API the way UI components do and check
//! the cart invariants after every step.

use std::num::NonZeroU32;

use gomarketplace_cart::{CartError, CartScope, FileStorage, HydrationReport, PersistenceMode, use_cart};
use gomarketplace_core::{MutationOutcome, ProductId};
use gomarketplace_integration_tests::{TestCart, product};

fn qty(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

// =============================================================================
// Provider Scope Tests
// =============================================================================

#[test]
fn test_use_cart_outside_provider_fails() {
    let scope: CartScope<FileStorage> = CartScope::detached();
    assert!(matches!(use_cart(&scope), Err(CartError::OutsideProvider)));
}

#[tokio::test]
async fn test_fresh_provider_hydrates_empty() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    assert_eq!(cart.provider.hydrated().await, HydrationReport::Empty);

    let handle = use_cart(&cart.provider.scope()).unwrap();
    assert!(handle.items().is_empty());
}

// =============================================================================
// Operation Tests
// =============================================================================

#[tokio::test]
async fn test_walkthrough() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    cart.provider.hydrated().await;
    let handle = use_cart(&cart.provider.scope()).unwrap();
    let id = ProductId::new("p1");

    handle.add_to_cart(product("p1", "Shirt", 1000)).persist.wait().await.unwrap();
    assert_eq!(handle.items()[0].quantity, qty(1));

    handle.increment(&id).persist.wait().await.unwrap();
    assert_eq!(handle.items()[0].quantity, qty(2));

    handle.decrement(&id).persist.wait().await.unwrap();
    assert_eq!(handle.items()[0].quantity, qty(1));

    let update = handle.decrement(&id);
    update.persist.wait().await.unwrap();
    assert_eq!(update.outcome, MutationOutcome::Removed);
    assert!(handle.items().is_empty());
}

#[tokio::test]
async fn test_add_existing_never_grows_list() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    cart.provider.hydrated().await;
    let handle = use_cart(&cart.provider.scope()).unwrap();

    handle.add_to_cart(product("p1", "Shirt", 1000)).persist.wait().await.unwrap();
    handle.add_to_cart(product("p2", "Mug", 450)).persist.wait().await.unwrap();
    let len = handle.items().len();

    let update = handle.add_to_cart(product("p1", "Shirt", 1000));
    update.persist.wait().await.unwrap();
    let outcome = update.outcome;
    assert_eq!(outcome, MutationOutcome::Incremented { quantity: qty(2) });
    assert_eq!(handle.items().len(), len);
}

#[tokio::test]
async fn test_add_novel_appends_at_end() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    cart.provider.hydrated().await;
    let handle = use_cart(&cart.provider.scope()).unwrap();

    handle.add_to_cart(product("p1", "Shirt", 1000)).persist.wait().await.unwrap();
    handle.add_to_cart(product("p2", "Mug", 450)).persist.wait().await.unwrap();

    let items = handle.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].id, ProductId::new("p2"));
    assert_eq!(items[1].quantity, qty(1));
}

#[tokio::test]
async fn test_unknown_id_is_noop() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    cart.provider.hydrated().await;
    let handle = use_cart(&cart.provider.scope()).unwrap();
    handle.add_to_cart(product("p1", "Shirt", 1000)).persist.wait().await.unwrap();
    let before = handle.state();

    let missing = ProductId::new("missing");
    for update in [handle.increment(&missing), handle.decrement(&missing)] {
        assert_eq!(update.outcome, MutationOutcome::NotFound);
        update.persist.wait().await.unwrap();
    }
    assert_eq!(handle.state(), before);
}

#[tokio::test]
async fn test_quantities_stay_positive_over_mixed_sequence() {
    let cart = TestCart::mount(PersistenceMode::NextState);
    cart.provider.hydrated().await;
    let handle = use_cart(&cart.provider.scope()).unwrap();

    let ids = ["p1", "p2", "p3"];
    let mut writes = Vec::new();
    // Deterministic linear congruential sequence
    let mut seed: u64 = 0x2545_F491;
    for _ in 0..300 {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let id = ids[usize::try_from((seed >> 33) % 3).unwrap()];
        let before = handle.state();

        let update = match (seed >> 40) % 3 {
            0 => handle.add_to_cart(product(id, id, 100)),
            1 => handle.increment(&ProductId::new(id)),
            _ => handle.decrement(&ProductId::new(id)),
        };
        let outcome = update.outcome;
        writes.push(update.persist);

        let after = handle.state();
        assert!(after.items().iter().all(|item| item.quantity.get() >= 1));
        match outcome {
            MutationOutcome::Removed => {
                assert_eq!(after.len(), before.len() - 1);
                assert!(after.get(&ProductId::new(id)).is_none());
            }
            MutationOutcome::Added => assert_eq!(after.len(), before.len() + 1),
            MutationOutcome::NotFound => assert_eq!(after, before),
            MutationOutcome::Incremented { .. } | MutationOutcome::Decremented { .. } => {
                assert_eq!(after.len(), before.len());
            }
        }
    }

    for write in writes {
        write.wait().await.unwrap();
    }
}
