//! Error types for the cart store.

use thiserror::Error;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend refused or could not serve the request.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Cart-level error type.
///
/// Only `OutsideProvider` reaches consumers through the consumer API. The
/// other variants surface when a caller chooses to await a persistence task.
#[derive(Debug, Error)]
pub enum CartError {
    /// Consumer API was requested from a scope with no mounted provider.
    #[error("use_cart must be used within a CartProvider")]
    OutsideProvider,

    /// Storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cart could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Background persistence task panicked or was cancelled.
    #[error("Persistence task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
