//! Read-through loading over the mirror and persistent caches.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use turbo_cache::{CacheEntry, MirrorCache, PersistentCache};

/// The two cache tiers a reader consults, shared by every reader of one
/// storefront.
#[derive(Clone)]
pub struct CacheLayers {
    mirror: Arc<MirrorCache>,
    persistent: PersistentCache,
}

impl CacheLayers {
    pub fn new(mirror: Arc<MirrorCache>, persistent: PersistentCache) -> Self {
        Self { mirror, persistent }
    }

    pub fn mirror(&self) -> &MirrorCache {
        &self.mirror
    }

    pub fn persistent(&self) -> &PersistentCache {
        &self.persistent
    }

    /// Return the value under `key`, fetching it only when neither tier
    /// holds a fresh copy.
    ///
    /// A persistent hit is copied into the mirror with its original
    /// timestamp. A fetched value is written through both tiers. A failed
    /// fetch leaves both tiers untouched.
    pub async fn load<T, E, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.mirror.get::<T>(key) {
            debug!(key, tier = "mirror", "cache hit");
            return Ok(value);
        }

        if let Some(entry) = self.persistent.get_entry::<T>(key) {
            debug!(key, tier = "persistent", "cache hit");
            let value = entry.value.clone();
            self.mirror.insert_entry(key, entry);
            return Ok(value);
        }

        debug!(key, "cache miss, fetching");
        let value = fetch().await?;
        let entry = CacheEntry::new(value.clone(), self.persistent.now_ms(), ttl);
        self.persistent.set_entry(key, &entry);
        self.mirror.insert_entry(key, entry);
        Ok(value)
    }

    /// Cached value under `key`, without fetching.
    pub fn peek<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        self.mirror
            .get::<T>(key)
            .or_else(|| self.persistent.get::<T>(key))
    }
}

/// A reader bound to one storage key and TTL.
pub struct CachedReader<T> {
    layers: CacheLayers,
    key: String,
    ttl: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CachedReader<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(layers: CacheLayers, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            layers,
            key: key.into(),
            ttl,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn load<E, F, Fut>(&self, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.layers.load(&self.key, self.ttl, fetch).await
    }

    pub fn peek(&self) -> Option<T> {
        self.layers.peek(&self.key)
    }
}

/// Decode a list payload without failing on its shape.
///
/// A bare array or a `{"data": [...]}` envelope is accepted. Anything else
/// is an empty list. Elements that fail to decode are skipped.
pub fn lenient_list<T: DeserializeOwned>(payload: Value) -> Vec<T> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                debug!("object payload without a data array, treating as empty list");
                return Vec::new();
            }
        },
        other => {
            debug!(kind = json_kind(&other), "non-list payload, treating as empty list");
            return Vec::new();
        }
    };

    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "skipping malformed list element");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        debug!(total, kept = decoded.len(), "list decoded with skipped elements");
    }
    decoded
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
