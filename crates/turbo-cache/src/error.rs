//! Cache error types.

use thiserror::Error;

/// Errors that can occur when talking to durable storage.
///
/// These never escape the cache layer itself: [`crate::PersistentCache`]
/// logs and swallows them. They are public because the raw [`crate::Storage`]
/// backends are also used directly for credentials and the cart list.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to open the store.
    #[error("Failed to open store: {0}")]
    OpenError(String),

    /// Failed to serialize or deserialize a value.
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Writing the value would exceed the store's capacity.
    #[error("Quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
