//! Provider scope that hands the cart store to dependent components.
//!
//! A [`CartProvider`] owns one [`CartStore`] for the lifetime of a UI
//! subtree. Components receive a [`CartScope`] from their parent and call
//! [`use_cart`] to get the consumer API. A scope that was not produced by a
//! provider yields [`CartError::OutsideProvider`].

use std::sync::Arc;

use gomarketplace_core::{CartItem, CartState, NewCartItem, Price, ProductId};

use crate::config::CartConfig;
use crate::error::CartError;
use crate::storage::CartStorage;
use crate::store::{CartStore, CartUpdate, HydrationReport, HydrationStatus};

/// Owner of a cart store for one mounted subtree.
///
/// Dropping the provider releases the in-memory cart; persisted data stays.
#[derive(Debug)]
pub struct CartProvider<S> {
    store: Arc<CartStore<S>>,
}

impl<S: CartStorage> CartProvider<S> {
    /// Create the store and start hydrating it in the background.
    ///
    /// Must be called from within a Tokio runtime. Hydration is not awaited;
    /// use [`CartProvider::hydrated`] to observe it.
    #[must_use]
    pub fn mount(storage: S, config: &CartConfig) -> Self {
        let store = Arc::new(CartStore::new(storage, config));
        let hydrating = Arc::clone(&store);
        tokio::spawn(async move {
            hydrating.hydrate().await;
        });
        tracing::debug!(key = %config.storage_key, "Cart provider mounted");
        Self { store }
    }

    /// Wait until the background hydration has finished.
    pub async fn hydrated(&self) -> HydrationReport {
        self.store.hydrate().await
    }

    /// Scope to hand to components nested under this provider.
    #[must_use]
    pub fn scope(&self) -> CartScope<S> {
        CartScope {
            store: Some(Arc::clone(&self.store)),
        }
    }

    #[must_use]
    pub fn store(&self) -> &CartStore<S> {
        &self.store
    }
}

/// Context passed down the component tree.
#[derive(Debug)]
pub struct CartScope<S> {
    store: Option<Arc<CartStore<S>>>,
}

impl<S> CartScope<S> {
    /// A scope with no provider above it.
    #[must_use]
    pub const fn detached() -> Self {
        Self { store: None }
    }

    /// Whether a provider is mounted above this scope.
    #[must_use]
    pub const fn is_provided(&self) -> bool {
        self.store.is_some()
    }
}

impl<S> Clone for CartScope<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> Default for CartScope<S> {
    fn default() -> Self {
        Self::detached()
    }
}

/// Get the cart consumer API from a scope.
///
/// # Errors
///
/// Returns `CartError::OutsideProvider` if no provider is mounted above
/// `scope`. This is an integration mistake, not a runtime condition.
pub fn use_cart<S: CartStorage>(scope: &CartScope<S>) -> Result<CartHandle<S>, CartError> {
    scope
        .store
        .as_ref()
        .map(|store| CartHandle {
            store: Arc::clone(store),
        })
        .ok_or(CartError::OutsideProvider)
}

/// Consumer-facing cart API: a read-only view plus the three mutations.
#[derive(Debug)]
pub struct CartHandle<S> {
    store: Arc<CartStore<S>>,
}

impl<S> Clone for CartHandle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CartStorage> CartHandle<S> {
    /// Cart lines in display order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.store.items()
    }

    #[must_use]
    pub fn state(&self) -> CartState {
        self.store.state()
    }

    #[must_use]
    pub fn status(&self) -> HydrationStatus {
        self.store.status()
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.store.item_count()
    }

    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.store.subtotal()
    }

    pub fn add_to_cart(&self, item: NewCartItem) -> CartUpdate {
        self.store.add_to_cart(item)
    }

    pub fn increment(&self, id: &ProductId) -> CartUpdate {
        self.store.increment(id)
    }

    pub fn decrement(&self, id: &ProductId) -> CartUpdate {
        self.store.decrement(id)
    }
}
