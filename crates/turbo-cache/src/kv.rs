//! Durable string-keyed storage backends.
//!
//! Everything the storefront persists (cache entries, credentials, the local
//! cart list) goes through a [`Storage`]: a synchronous key/value store with
//! JSON-encoded string values, scoped to a single origin.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::lock::mutex_lock;
use crate::CacheError;

const SOURCE: &str = "cache::kv";

/// A synchronous key/value store.
///
/// Calls may fail (I/O, quota); callers decide whether a failure matters.
pub trait Storage: Send + Sync {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// List every key in the store.
    fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }
}

/// JSON helpers available on every [`Storage`].
pub trait StorageExt: Storage {
    /// Read and deserialize the value stored under `key`.
    ///
    /// ```rust,ignore
    /// let lines: Option<Vec<CartLine>> = storage.get_json("cart_items")?;
    /// ```
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize `value` and store it under `key`.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

/// In-process storage, lost when the process exits.
///
/// An optional byte quota mimics the capacity limit of real durable stores.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create an empty, unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that rejects writes beyond `bytes` in total
    /// (keys plus values).
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(bytes),
        }
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(mutex_lock(&self.entries, SOURCE, "memory.get").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "memory.set");
        if let Some(limit) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(CacheError::QuotaExceeded { needed, limit });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        mutex_lock(&self.entries, SOURCE, "memory.delete").remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(mutex_lock(&self.entries, SOURCE, "memory.keys")
            .keys()
            .cloned()
            .collect())
    }
}

/// Storage persisted as a single JSON object file per origin.
///
/// Nothing is held in memory: every read parses the file as it is on disk
/// now, so writes made by other processes on the same origin are visible
/// immediately. A write takes an exclusive lock on a sibling `.lock` file,
/// re-reads the file, changes the one key and replaces the file through a
/// temporary sibling and a rename. Concurrent writers therefore never drop
/// each other's keys, and a crash mid-write leaves the previous contents
/// intact.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStorage {
    /// Open (or create on first write) the store at `path`.
    ///
    /// A file that cannot be parsed is treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        read_entries(&path)
            .map_err(|e| CacheError::OpenError(format!("{}: {}", path.display(), e)))?;
        let lock_path = path.with_extension("json.lock");
        Ok(Self { path, lock_path })
    }

    /// Open the store for `origin` inside `dir`.
    ///
    /// ```rust,ignore
    /// let storage = FileStorage::for_origin(".storefront", "https://shop.example")?;
    /// // -> .storefront/https___shop.example.json
    /// ```
    pub fn for_origin(dir: impl AsRef<Path>, origin: &str) -> Result<Self, CacheError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(|e| CacheError::OpenError(format!("{}: {}", dir.display(), e)))?;
        Self::open(dir.join(format!("{}.json", origin_file_stem(origin))))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to the current on-disk entries while holding the
    /// writer lock. The file is rewritten only when `change` returns true.
    fn update<F>(&self, change: F) -> Result<(), CacheError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let guard = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        guard.lock()?;

        let mut entries = read_entries(&self.path)?;
        if change(&mut entries) {
            let content = serde_json::to_string_pretty(&entries)?;
            let tmp = self.path.with_extension("json.tmp");
            fs::write(&tmp, content)?;
            fs::rename(&tmp, &self.path)?;
        }
        // Dropping the handle releases the lock.
        drop(guard);
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(read_entries(&self.path)?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.update(|entries| entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(read_entries(&self.path)?.into_keys().collect())
    }
}

/// The entries currently on disk. A missing file is empty; so is one that
/// cannot be parsed.
fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, std::io::Error> {
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding unreadable storage file");
                Ok(BTreeMap::new())
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e),
    }
}

fn origin_file_stem(origin: &str) -> String {
    let stem: String = origin
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "default".to_string()
    } else {
        stem
    }
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust,ignore
/// let key = cache_key!("subcategories_v1", category_id);
/// // Returns "subcategories_v1:42"
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip_and_delete() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("token").unwrap(), None);

        storage.set("token", "abc").unwrap();
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("abc"));
        assert!(storage.exists("token").unwrap());

        storage.delete("token").unwrap();
        storage.delete("token").unwrap();
        assert!(!storage.exists("token").unwrap());
    }

    #[test]
    fn test_memory_quota_rejects_oversized_write() {
        let storage = MemoryStorage::with_quota(16);
        storage.set("k", "small").unwrap();

        let err = storage.set("big", &"x".repeat(64)).unwrap_err();
        assert!(matches!(err, CacheError::QuotaExceeded { limit: 16, .. }));

        // Replacing an existing key only counts the new value.
        storage.set("k", "0123456789abcd").unwrap();
    }

    #[test]
    fn test_json_helpers() {
        let storage = MemoryStorage::new();
        storage.set_json("ids", &vec![1, 2, 3]).unwrap();
        let ids: Option<Vec<u32>> = storage.get_json("ids").unwrap();
        assert_eq!(ids, Some(vec![1, 2, 3]));

        storage.set("ids", "not json").unwrap();
        assert!(storage.get_json::<Vec<u32>>("ids").is_err());
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let storage = FileStorage::for_origin(dir.path(), "https://shop.example").unwrap();
            storage.set("user", r#"{"id":1}"#).unwrap();
            storage.set("token", "t").unwrap();
            storage.delete("token").unwrap();
            storage.path().to_path_buf()
        };

        assert!(path.ends_with("https___shop.example.json"));

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("user").unwrap().as_deref(), Some(r#"{"id":1}"#));
        assert_eq!(reopened.get("token").unwrap(), None);
    }

    #[test]
    fn test_file_storage_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert!(storage.keys().unwrap().is_empty());
        storage.set("a", "1").unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_file_storage_handles_share_writes() {
        let dir = tempfile::tempdir().unwrap();
        let origin = "https://shop.example";
        let banners = FileStorage::for_origin(dir.path(), origin).unwrap();
        let login = FileStorage::for_origin(dir.path(), origin).unwrap();

        login.set("token", "tok").unwrap();
        login.set("user", r#"{"id":1}"#).unwrap();
        assert_eq!(banners.get("token").unwrap().as_deref(), Some("tok"));

        // A write through the other handle must not drop the login.
        banners.set("vipuri_banners_v4", "[]").unwrap();
        let reopened = FileStorage::for_origin(dir.path(), origin).unwrap();
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("tok"));
        assert_eq!(reopened.get("vipuri_banners_v4").unwrap().as_deref(), Some("[]"));

        // A sign-out elsewhere is not undone by a later unrelated write.
        reopened.delete("token").unwrap();
        banners.set("cart_items", "[]").unwrap();
        assert_eq!(login.get("token").unwrap(), None);
        assert_eq!(
            login.keys().unwrap(),
            vec!["cart_items".to_string(), "user".to_string(), "vipuri_banners_v4".to_string()]
        );
    }

    #[test]
    fn test_file_storage_concurrent_writers_keep_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let storage = FileStorage::open(&path).unwrap();
                    for j in 0..5 {
                        storage.set(&format!("k{i}-{j}"), "v").unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(FileStorage::open(&path).unwrap().keys().unwrap().len(), 40);
    }

    #[test]
    fn test_cache_key_macro() {
        assert_eq!(cache_key!("subcategories_v1", 42), "subcategories_v1:42");
        assert_eq!(cache_key!("a", "b", 3), "a:b:3");
    }
}
