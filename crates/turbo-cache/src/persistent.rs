//! TTL cache on top of durable storage.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::entry::CacheEntry;
use crate::{Clock, Storage};

/// Time-boxed cache persisted in a [`Storage`].
///
/// Caching is an optimization only: every failure (missing key, corrupt
/// JSON, stale entry, storage error, quota) reads as a miss or a dropped
/// write, never as an error to the caller.
#[derive(Clone)]
pub struct PersistentCache {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
}

impl PersistentCache {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Get a fresh value, or `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Get a fresh entry including its timestamps, or `None`.
    ///
    /// Freshness is judged against the clock at read time.
    pub fn get_entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "persistent cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "persistent cache read failed");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key, error = %e, "persistent cache entry unreadable");
                return None;
            }
        };

        if entry.is_fresh(self.clock.now_ms()) {
            Some(entry)
        } else {
            debug!(key, stored_at = entry.stored_at_epoch_ms, "persistent cache entry stale");
            None
        }
    }

    /// Store `value` stamped with the current time.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        self.set_entry(key, &CacheEntry::new(value, self.clock.now_ms(), ttl));
    }

    /// Store a prepared entry as-is.
    pub fn set_entry<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) {
        let raw = match serde_json::to_string(entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "persistent cache entry not serializable");
                return;
            }
        };
        if let Err(e) = self.storage.set(key, &raw) {
            warn!(key, error = %e, "persistent cache write dropped");
        }
    }

    /// Current time according to this cache's clock.
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }
}
