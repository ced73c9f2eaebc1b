//! Result Cache Module
//!
//! Key/value store for operation results with TTL expiry and hit
//! accounting. The cache never initiates calls and never blocks: reads do
//! not evict, eviction is explicit via [`ResultCache::evict_expired`] or
//! the provider-scoped [`ResultCache::clear`].

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// One cached operation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key (provider + kind + canonical parameters)
    pub key: String,

    /// Owning provider; entries are purged when the provider is removed
    pub provider_id: Uuid,

    /// Operation kind the result came from
    pub kind: String,

    /// Cached result payload
    pub result: Value,

    /// Expiry timestamp; the entry is a miss once `now >= expires_at`
    pub expires_at: DateTime<Utc>,

    /// Read hits since creation
    pub hits: u64,

    /// Last read timestamp
    pub last_access: DateTime<Utc>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Cache occupancy counters for the analytics rollup
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Retained entries (including expired-but-unevicted)
    pub entries: usize,

    /// Hits across all retained entries
    pub total_hits: u64,
}

/// TTL'd operation result cache
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
}

/// Derive the cache key for an operation
///
/// Parameters are canonicalized (key-sorted JSON) so semantically identical
/// parameter maps share one entry regardless of construction order.
pub fn cache_key(provider_id: Uuid, kind: &str, params: &Value) -> String {
    let canonical =
        serde_json_canonicalizer::to_string(params).unwrap_or_else(|_| params.to_string());
    format!("{}:{}:{}", provider_id, kind, canonical)
}

impl ResultCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an entry; a hit increments the hit counter and updates
    /// last-access. Expired or absent entries miss without self-evicting.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entry = self.entries.get_mut(key)?;
        if Utc::now() >= entry.expires_at {
            return None;
        }
        entry.hits += 1;
        entry.last_access = Utc::now();
        Some(entry.result.clone())
    }

    /// Store a result, overwriting any entry sharing the key
    pub fn put(
        &self,
        key: String,
        provider_id: Uuid,
        kind: impl Into<String>,
        result: Value,
        ttl: std::time::Duration,
    ) {
        let now = Utc::now();
        // TTLs beyond chrono's range saturate to the far future instead
        // of overflowing.
        let expires_at = Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let entry = CacheEntry {
            key: key.clone(),
            provider_id,
            kind: kind.into(),
            result,
            expires_at,
            hits: 0,
            last_access: now,
            created_at: now,
        };
        self.entries.insert(key, entry);
    }

    /// Remove all entries whose expiry has passed, returning the count
    pub fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "Evicted expired cache entries");
        }
        evicted
    }

    /// Remove all entries, or only those scoped to one provider
    pub fn clear(&self, provider_id: Option<Uuid>) -> usize {
        let before = self.entries.len();
        match provider_id {
            Some(id) => self.entries.retain(|_, entry| entry.provider_id != id),
            None => self.entries.clear(),
        }
        before - self.entries.len()
    }

    /// Current occupancy counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            total_hits: self.entries.iter().map(|e| e.hits).sum(),
        }
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration as StdDuration;

    #[test]
    fn key_is_stable_across_map_ordering() {
        let id = Uuid::new_v4();
        let a: Value = serde_json::from_str(r#"{"b": 1, "a": 2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a": 2, "b": 1}"#).unwrap();
        assert_eq!(cache_key(id, "search", &a), cache_key(id, "search", &b));
    }

    #[test]
    fn round_trip_and_hit_accounting() {
        let cache = ResultCache::new();
        let id = Uuid::new_v4();
        let key = cache_key(id, "search", &json!({"q": "x"}));
        cache.put(
            key.clone(),
            id,
            "search",
            json!({"hits": 1}),
            StdDuration::from_secs(60),
        );

        assert_eq!(cache.get(&key), Some(json!({"hits": 1})));
        assert_eq!(cache.get(&key), Some(json!({"hits": 1})));
        assert_eq!(cache.stats().total_hits, 2);
    }

    #[tokio::test]
    async fn expired_entry_misses_without_evicting() {
        let cache = ResultCache::new();
        let id = Uuid::new_v4();
        let key = cache_key(id, "search", &json!({}));
        cache.put(
            key.clone(),
            id,
            "search",
            json!(1),
            StdDuration::from_millis(20),
        );

        tokio::time::sleep(StdDuration::from_millis(50)).await;
        assert_eq!(cache.get(&key), None);
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.evict_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn reput_overwrites_single_entry() {
        let cache = ResultCache::new();
        let id = Uuid::new_v4();
        let key = cache_key(id, "k", &json!({}));
        cache.put(key.clone(), id, "k", json!("first"), StdDuration::from_secs(60));
        cache.put(key.clone(), id, "k", json!("second"), StdDuration::from_secs(60));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key), Some(json!("second")));
    }

    #[test]
    fn oversized_ttl_saturates_instead_of_overflowing() {
        let cache = ResultCache::new();
        let id = Uuid::new_v4();
        let key = cache_key(id, "k", &json!({}));
        cache.put(key.clone(), id, "k", json!(1), StdDuration::MAX);
        assert_eq!(cache.get(&key), Some(json!(1)));
    }

    #[test]
    fn clear_scoped_to_provider() {
        let cache = ResultCache::new();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        cache.put(
            cache_key(p1, "k", &json!(1)),
            p1,
            "k",
            json!(1),
            StdDuration::from_secs(60),
        );
        cache.put(
            cache_key(p2, "k", &json!(1)),
            p2,
            "k",
            json!(1),
            StdDuration::from_secs(60),
        );

        assert_eq!(cache.clear(Some(p1)), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.clear(None), 1);
        assert!(cache.is_empty());
    }
}
