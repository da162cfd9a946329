//! Integration tests for GoMarketplace.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gomarketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Cart operations, invariants and hydration through the provider
//! - `cart_persistence` - File-backed persistence and the snapshot/next-state modes
//!
//! Tests use [`TestCart`], which mounts a provider over a [`FileStorage`] in a
//! unique temporary directory and removes it on drop.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use gomarketplace_cart::{CartConfig, CartProvider, FileStorage, PersistenceMode};
use gomarketplace_core::{NewCartItem, Price};

/// A provider over a throwaway storage directory.
pub struct TestCart {
    pub config: CartConfig,
    pub provider: CartProvider<FileStorage>,
}

impl TestCart {
    /// Mount a provider over a fresh, empty directory.
    #[must_use]
    pub fn mount(persistence: PersistenceMode) -> Self {
        let config = CartConfig {
            storage_dir: unique_dir(),
            persistence,
            ..CartConfig::default()
        };
        Self::mount_with(config)
    }

    /// Mount a provider with an explicit configuration.
    #[must_use]
    pub fn mount_with(config: CartConfig) -> Self {
        let provider = CartProvider::mount(FileStorage::new(&config.storage_dir), &config);
        Self { config, provider }
    }

    /// Mount a second provider over the same directory, as after an app restart.
    #[must_use]
    pub fn remount(&self) -> Self {
        Self::mount_with(self.config.clone())
    }

    /// Storage handle over the same directory.
    #[must_use]
    pub fn storage(&self) -> FileStorage {
        FileStorage::new(&self.config.storage_dir)
    }
}

impl Drop for TestCart {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.config.storage_dir);
    }
}

fn unique_dir() -> PathBuf {
    std::env::temp_dir().join(format!("gm-cart-it-{}", uuid::Uuid::new_v4()))
}

/// Product descriptor with a price in cents.
#[must_use]
pub fn product(id: &str, title: &str, cents: i64) -> NewCartItem {
    NewCartItem::new(id, title, format!("https://cdn.example/{id}.png"), Price::from_cents(cents))
}
