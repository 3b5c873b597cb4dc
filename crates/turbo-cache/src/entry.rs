//! TTL-tagged cache entries.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A cached value together with when it was stored and how long it lives.
///
/// Serialized as `{"value": .., "storedAtEpochMs": .., "ttlMs": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at_epoch_ms: i64,
    pub ttl_ms: u64,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, stored_at_epoch_ms: i64, ttl: Duration) -> Self {
        Self {
            value,
            stored_at_epoch_ms,
            ttl_ms: duration_ms(ttl),
        }
    }

    /// An entry is fresh iff `now - stored_at < ttl`.
    ///
    /// An entry stamped in the future (clock moved backwards) counts as fresh
    /// until its TTL would have run out from the stored timestamp.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        let age = i128::from(now_ms) - i128::from(self.stored_at_epoch_ms);
        age < i128::from(self.ttl_ms)
    }

    /// Milliseconds left before the entry goes stale, zero once stale.
    pub fn remaining_ms(&self, now_ms: i64) -> u64 {
        let expires = i128::from(self.stored_at_epoch_ms) + i128::from(self.ttl_ms);
        u64::try_from((expires - i128::from(now_ms)).max(0)).unwrap_or(u64::MAX)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheEntry<U> {
        CacheEntry {
            value: f(self.value),
            stored_at_epoch_ms: self.stored_at_epoch_ms,
            ttl_ms: self.ttl_ms,
        }
    }
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_boundary() {
        let entry = CacheEntry::new("v", 1_000, Duration::from_millis(500));
        assert!(entry.is_fresh(1_000));
        assert!(entry.is_fresh(1_499));
        assert!(!entry.is_fresh(1_500));
        assert!(!entry.is_fresh(9_999));
    }

    #[test]
    fn test_zero_ttl_is_never_fresh() {
        let entry = CacheEntry::new(1, 1_000, Duration::ZERO);
        assert!(!entry.is_fresh(1_000));
    }

    #[test]
    fn test_remaining() {
        let entry = CacheEntry::new((), 1_000, Duration::from_millis(500));
        assert_eq!(entry.remaining_ms(1_200), 300);
        assert_eq!(entry.remaining_ms(2_000), 0);
    }

    #[test]
    fn test_wire_format() {
        let entry = CacheEntry::new(vec![1, 2], 42, Duration::from_secs(1));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"value": [1, 2], "storedAtEpochMs": 42, "ttlMs": 1000})
        );
    }
}
