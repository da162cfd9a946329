//! In-process storage backend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::CartStorage;
use crate::error::StorageError;

/// Storage backed by a shared in-memory map.
///
/// Clones share the same map, so a clone handed to a store can be inspected
/// from the outside.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-seeded with one entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let entries = HashMap::from([(key.into(), value.into())]);
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }
}

impl CartStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_owned(), value);
        Ok(())
    }
}
