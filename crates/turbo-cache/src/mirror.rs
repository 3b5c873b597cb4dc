//! Process-lifetime mirror in front of the persistent cache.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::entry::CacheEntry;
use crate::lock::mutex_lock;
use crate::Clock;

const SOURCE: &str = "cache::mirror";

type Erased = Arc<dyn Any + Send + Sync>;

/// In-memory cache of already-decoded values.
///
/// Construct one per process and hand it to every reader; it is dropped with
/// the process, so a restart always falls through to the persistent tier.
/// Values of any type can share one mirror; a lookup with the wrong type is
/// simply a miss.
pub struct MirrorCache {
    entries: Mutex<HashMap<String, CacheEntry<Erased>>>,
    clock: Arc<dyn Clock>,
}

impl MirrorCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Get a fresh value for `key`.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();
        let entries = mutex_lock(&self.entries, SOURCE, "get");
        let entry = entries.get(key)?;
        if !entry.is_fresh(now) {
            debug!(key, "mirror entry stale");
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    /// Store `value` stamped with the current time.
    pub fn set<T: Send + Sync + 'static>(&self, key: &str, value: T, ttl: Duration) {
        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl);
        self.insert_entry(key, entry);
    }

    /// Store an entry keeping its original timestamps, so mirroring a
    /// persisted entry never extends its lifetime.
    pub fn insert_entry<T: Send + Sync + 'static>(&self, key: &str, entry: CacheEntry<T>) {
        let erased = entry.map(|value| Arc::new(value) as Erased);
        mutex_lock(&self.entries, SOURCE, "insert_entry").insert(key.to_string(), erased);
    }

    pub fn invalidate(&self, key: &str) {
        mutex_lock(&self.entries, SOURCE, "invalidate").remove(key);
    }

    pub fn clear(&self) {
        mutex_lock(&self.entries, SOURCE, "clear").clear();
    }

    /// Number of entries held, fresh or not.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
