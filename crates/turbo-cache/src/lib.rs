//! Durable TTL cache and in-memory mirror for the TurboCommerce storefront.
//!
//! Two tiers, checked in order by the catalog readers:
//!
//! - [`MirrorCache`]: decoded values kept for the life of the process.
//! - [`PersistentCache`]: JSON [`CacheEntry`] records in a durable
//!   [`Storage`] that outlives restarts.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use turbo_cache::{FileStorage, PersistentCache, SystemClock};
//!
//! let storage = Arc::new(FileStorage::for_origin(".storefront", "https://shop.example")?);
//! let cache = PersistentCache::new(storage, Arc::new(SystemClock));
//!
//! cache.set("vipuri_banners_v4", &banners, Duration::from_secs(12 * 3600));
//! let banners: Option<Vec<Banner>> = cache.get("vipuri_banners_v4");
//! ```

mod clock;
mod entry;
mod error;
mod kv;
mod lock;
mod mirror;
mod persistent;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use error::CacheError;
pub use kv::{FileStorage, MemoryStorage, Storage, StorageExt};
pub use lock::mutex_lock;
pub use mirror::MirrorCache;
pub use persistent::PersistentCache;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CacheEntry, CacheError, Clock, MirrorCache, PersistentCache, Storage, StorageExt,
    };
}
