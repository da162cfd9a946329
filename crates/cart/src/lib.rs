//! GoMarketplace Cart - Persistent shopping-cart store.
//!
//! Holds the ordered list of cart lines in memory, mirrors it to a key-value
//! storage backend on every mutation, and hydrates itself once from storage
//! when mounted.
//!
//! # Architecture
//!
//! - [`storage`] - `CartStorage` trait with in-memory and file backends
//! - [`store`] - `CartStore`, the hydration and mutation state machine
//! - [`provider`] - `CartProvider` scope and the `use_cart` consumer API
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use gomarketplace_cart::{CartConfig, CartProvider, MemoryStorage, use_cart};
//! use gomarketplace_core::{NewCartItem, Price};
//!
//! # async fn demo() -> Result<(), gomarketplace_cart::CartError> {
//! let provider = CartProvider::mount(MemoryStorage::new(), &CartConfig::default());
//! provider.hydrated().await;
//!
//! let cart = use_cart(&provider.scope())?;
//! let update = cart.add_to_cart(NewCartItem::new("p1", "Shirt", "u", Price::from_cents(1000)));
//! update.persist.wait().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod provider;
pub mod storage;
pub mod store;

pub use config::{CartConfig, ConfigError, PersistenceMode};
pub use error::{CartError, StorageError};
pub use provider::{CartHandle, CartProvider, CartScope, use_cart};
pub use storage::{CartStorage, FileStorage, MemoryStorage};
pub use store::{CartStore, CartUpdate, HydrationReport, HydrationStatus, PersistTask};
