//! Key-value storage backends for the persisted cart.
//!
//! The cart is stored as one JSON blob under a single key. Backends only
//! need `get` and `set`; the store never deletes keys.

mod file;
mod memory;

use std::future::Future;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

/// Async key-value store holding string blobs.
///
/// Writes are last-write-wins with no conflict detection.
pub trait CartStorage: Send + Sync + 'static {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), StorageError>> + Send;
}
