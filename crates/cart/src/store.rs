//! The cart store: in-memory cart state mirrored to key-value storage.
//!
//! # Lifecycle
//!
//! A store starts [`HydrationStatus::Uninitialized`] with an empty cart.
//! [`CartStore::hydrate`] reads the stored blob once and moves the store to
//! [`HydrationStatus::Ready`]. Mutations are accepted in either state, but a
//! mutation applied before hydration finishes is overwritten if storage
//! holds a cart. Writes scheduled before hydration are held until it
//! finishes, so they can never replace the stored cart before it is read.
//! Stored lines that fail to decode are skipped one by one.
//!
//! # Persistence
//!
//! Every mutation, including one that matched no line, schedules a write of
//! the whole cart and returns it as a [`PersistTask`]. Dropping the task
//! leaves the write running. Writes carry a sequence number and a write older
//! than the last completed one is skipped, so storage converges on the
//! newest state even if tasks are scheduled out of order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gomarketplace_core::{CartItem, CartState, MutationOutcome, NewCartItem, Price, ProductId};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::config::{CartConfig, PersistenceMode};
use crate::error::{CartError, Result};
use crate::storage::CartStorage;

/// Whether the store has finished its one-time load from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationStatus {
    Uninitialized,
    Ready,
}

/// What hydration found in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationReport {
    /// A stored cart replaced the in-memory state. `skipped` counts stored
    /// lines that could not be decoded.
    Restored { items: usize, skipped: usize },
    /// Nothing was stored under the key.
    Empty,
    /// The read failed or the blob was not an item array; state was left as is.
    Failed,
}

/// Result of a mutation: what changed, plus the write it scheduled.
#[derive(Debug)]
pub struct CartUpdate {
    pub outcome: MutationOutcome,
    pub persist: PersistTask,
}

/// Handle to a background storage write.
///
/// The write runs whether or not the handle is awaited.
#[derive(Debug)]
pub struct PersistTask {
    handle: JoinHandle<Result<()>>,
}

impl PersistTask {
    /// Wait for the write to finish.
    ///
    /// # Errors
    ///
    /// Returns the storage or serialization error the write hit, or
    /// `CartError::TaskFailed` if the task panicked or was cancelled.
    pub async fn wait(self) -> Result<()> {
        self.handle
            .await
            .map_err(|e| CartError::TaskFailed(e.to_string()))?
    }

    /// Whether the write has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

struct StoreInner {
    state: CartState,
    status: HydrationStatus,
    report: Option<HydrationReport>,
    /// Mutations applied while still uninitialized.
    early_mutations: u64,
    next_seq: u64,
}

/// Cart state holder synchronized with a storage backend.
pub struct CartStore<S> {
    storage: Arc<S>,
    key: Arc<str>,
    mode: PersistenceMode,
    inner: Mutex<StoreInner>,
    hydration_gate: tokio::sync::Mutex<()>,
    /// Sequence number of the last write that reached storage.
    last_written: Arc<tokio::sync::Mutex<u64>>,
    /// `None` until hydrated, then the last sequence number whose state the
    /// hydrated cart replaced.
    hydrated: watch::Sender<Option<u64>>,
}

impl<S> CartStore<S> {
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S> std::fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("mode", &self.mode)
            .field("status", &inner.status)
            .field("items", &inner.state.len())
            .finish_non_exhaustive()
    }
}

impl<S: CartStorage> CartStore<S> {
    /// Create an empty, uninitialized store over `storage`.
    #[must_use]
    pub fn new(storage: S, config: &CartConfig) -> Self {
        Self {
            storage: Arc::new(storage),
            key: Arc::from(config.storage_key.as_str()),
            mode: config.persistence,
            inner: Mutex::new(StoreInner {
                state: CartState::new(),
                status: HydrationStatus::Uninitialized,
                report: None,
                early_mutations: 0,
                next_seq: 0,
            }),
            hydration_gate: tokio::sync::Mutex::new(()),
            last_written: Arc::new(tokio::sync::Mutex::new(0)),
            hydrated: watch::Sender::new(None),
        }
    }

    /// Storage key the cart lives under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn persistence_mode(&self) -> PersistenceMode {
        self.mode
    }

    #[must_use]
    pub fn status(&self) -> HydrationStatus {
        self.lock().status
    }

    /// Load the stored cart, once.
    ///
    /// Later calls (or concurrent ones) wait for the first and return its
    /// report without touching storage again. Read and parse failures are
    /// logged and treated as an empty store.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn hydrate(&self) -> HydrationReport {
        let _gate = self.hydration_gate.lock().await;
        let finished = self.lock().report;
        if let Some(report) = finished {
            return report;
        }

        let loaded = match self.storage.get(&self.key).await {
            Ok(Some(blob)) => match CartState::from_json_lossy(&blob) {
                Ok((state, skipped)) => {
                    for line in &skipped {
                        tracing::warn!(
                            index = line.index,
                            reason = %line.reason,
                            "Skipping unreadable stored cart line"
                        );
                    }
                    Some((state, skipped.len()))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Stored cart is malformed, starting empty");
                    None
                }
            },
            Ok(None) => {
                tracing::debug!("No stored cart");
                return self.finish_hydration(None, HydrationReport::Empty);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored cart, starting empty");
                None
            }
        };

        match loaded {
            Some((state, skipped)) => {
                let items = state.len();
                self.finish_hydration(Some(state), HydrationReport::Restored { items, skipped })
            }
            None => self.finish_hydration(None, HydrationReport::Failed),
        }
    }

    fn finish_hydration(&self, state: Option<CartState>, report: HydrationReport) -> HydrationReport {
        let mut inner = self.lock();
        let mut replaced_through = 0;
        if let Some(state) = state {
            replaced_through = inner.next_seq;
            if inner.early_mutations > 0 {
                tracing::warn!(
                    discarded = inner.early_mutations,
                    "Stored cart replaced mutations made before hydration"
                );
            }
            inner.state = state;
        }
        inner.status = HydrationStatus::Ready;
        inner.report = Some(report);
        self.hydrated.send_replace(Some(replaced_through));
        tracing::info!(?report, items = inner.state.len(), "Cart hydrated");
        report
    }

    /// Cloned snapshot of the cart lines in display order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().state.items().to_vec()
    }

    /// Cloned snapshot of the whole cart.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.lock().state.clone()
    }

    /// Total units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lock().state.item_count()
    }

    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lock().state.subtotal()
    }

    /// Add one unit of a product, appending a new line if needed.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn add_to_cart(&self, item: NewCartItem) -> CartUpdate {
        let id = item.id.clone();
        self.mutate("add_to_cart", &id, |state| state.add(item))
    }

    /// Add one unit to an existing line.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn increment(&self, id: &ProductId) -> CartUpdate {
        self.mutate("increment", id, |state| state.increment(id))
    }

    /// Remove one unit from an existing line, removing the line at zero.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn decrement(&self, id: &ProductId) -> CartUpdate {
        self.mutate("decrement", id, |state| state.decrement(id))
    }

    fn mutate<F>(&self, op: &'static str, id: &ProductId, apply: F) -> CartUpdate
    where
        F: FnOnce(&mut CartState) -> MutationOutcome,
    {
        let (outcome, seq, blob) = {
            let mut inner = self.lock();
            let snapshot = match self.mode {
                PersistenceMode::Snapshot => Some(inner.state.clone()),
                PersistenceMode::NextState => None,
            };

            let outcome = apply(&mut inner.state);
            if inner.status == HydrationStatus::Uninitialized {
                inner.early_mutations += 1;
            }

            let blob = snapshot.as_ref().unwrap_or(&inner.state).to_json();
            inner.next_seq += 1;
            (outcome, inner.next_seq, blob)
        };

        if outcome.changed() {
            tracing::debug!(op, product_id = %id, ?outcome, "Cart updated");
        } else {
            tracing::debug!(op, product_id = %id, "No cart line matched");
        }

        CartUpdate {
            outcome,
            persist: self.spawn_write(seq, blob),
        }
    }

    fn spawn_write(
        &self,
        seq: u64,
        blob: std::result::Result<String, serde_json::Error>,
    ) -> PersistTask {
        let storage = Arc::clone(&self.storage);
        let key = Arc::clone(&self.key);
        let last_written = Arc::clone(&self.last_written);
        let hydrated = self.hydrated.subscribe();

        let handle = tokio::spawn(async move {
            let result =
                write_blob(storage.as_ref(), &key, &last_written, hydrated, seq, blob).await;
            if let Err(e) = &result {
                tracing::error!(key = %key, seq, error = %e, "Failed to persist cart");
            }
            result
        });

        PersistTask { handle }
    }
}

async fn write_blob<S: CartStorage>(
    storage: &S,
    key: &str,
    last_written: &tokio::sync::Mutex<u64>,
    mut hydrated: watch::Receiver<Option<u64>>,
    seq: u64,
    blob: std::result::Result<String, serde_json::Error>,
) -> Result<()> {
    let blob = blob?;

    let Ok(replaced_through) = hydrated
        .wait_for(Option::is_some)
        .await
        .map(|current| (*current).unwrap_or_default())
    else {
        tracing::warn!(seq, "Store dropped before hydration, discarding cart write");
        return Ok(());
    };
    if seq <= replaced_through {
        tracing::debug!(seq, "Skipping cart write replaced by hydrated cart");
        return Ok(());
    }

    let mut last = last_written.lock().await;
    if seq < *last {
        tracing::debug!(seq, last = *last, "Skipping superseded cart write");
        return Ok(());
    }
    storage.set(key, blob).await?;
    *last = seq;
    Ok(())
}
