// DramaShelf - Short Drama Catalog Core
// Copyright (C) 2026 DramaShelf contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Time-boxed response cache
//!
//! Keyed store with a freshness window over the key-value collaborator.
//! Entries are visible only while `now - stored_at < ttl`; a stale entry is
//! reported as a miss and left in place for the next write to overwrite.
//!
//! Write failures never reach the caller: on a full medium the cache purges
//! every entry under its own prefix and retries once, otherwise it logs and
//! moves on. A cache that cannot write only costs a refetch.
//!
//! There is no single-flight guard. Two callers racing get-miss-fetch-put on
//! the same key both hit upstream; the second write wins and the cache stays
//! consistent, so the duplicate fetch is accepted.

use crate::clock::Clock;
use crate::storage::kv::{KvError, KvStore};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Default freshness window (5 minutes)
pub const DEFAULT_TTL_SECS: i64 = 300;

/// Key namespace; bulk operations (purge, invalidate) only touch keys under
/// this prefix so progress/favorites/settings entries are never collateral
const CACHE_PREFIX: &str = "dramashelf_cache:";

/// Stored envelope around a cached payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    payload: Value,
}

/// TTL cache over the persistent key-value medium
#[derive(Clone)]
pub struct TtlCache {
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl TtlCache {
    /// Cache with the default 300 s freshness window
    pub fn new(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(kv, clock, Duration::seconds(DEFAULT_TTL_SECS))
    }

    pub fn with_ttl(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { kv, clock, ttl }
    }

    /// Fresh payload for `key`, or `None` on miss/stale/unreadable entry
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let stored = match self.kv.get(&self.full_key(key)).await {
            Ok(v) => v?,
            Err(e) => {
                log::warn!("cache read failed for {}: {}", key, e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&stored) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("discarding unreadable cache entry {}: {}", key, e);
                return None;
            }
        };

        let age = self.clock.now() - entry.stored_at;
        if age >= self.ttl {
            log::debug!("cache stale for {} (age {}s)", key, age.num_seconds());
            return None;
        }

        match serde_json::from_value(entry.payload) {
            Ok(payload) => {
                log::debug!("cache hit for {}", key);
                Some(payload)
            }
            Err(e) => {
                log::warn!("cache payload shape changed for {}: {}", key, e);
                None
            }
        }
    }

    /// Record `payload` under `key` with `stored_at = now`
    ///
    /// Failure is absorbed: a full medium triggers a purge of all cache
    /// entries and one retry, anything else is logged and dropped.
    pub async fn put<T: Serialize>(&self, key: &str, payload: &T) {
        let payload = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("unserializable cache payload for {}: {}", key, e);
                return;
            }
        };
        let entry = CacheEntry {
            stored_at: self.clock.now(),
            payload,
        };
        // CacheEntry with a Value payload cannot fail to serialize
        let serialized = serde_json::to_string(&entry).unwrap_or_default();
        let full_key = self.full_key(key);

        match self.kv.set(&full_key, &serialized).await {
            Ok(()) => {}
            Err(KvError::CapacityExceeded) => {
                log::warn!("cache medium full, purging before retrying {}", key);
                self.purge().await;
                if let Err(e) = self.kv.set(&full_key, &serialized).await {
                    log::warn!("cache write failed after purge for {}: {}", key, e);
                }
            }
            Err(e) => {
                log::warn!("cache write failed for {}: {}", key, e);
            }
        }
    }

    /// Drop every cache entry (payloads are locale-specific, so a locale
    /// switch invalidates the whole cache)
    pub async fn invalidate_all(&self) {
        self.purge().await;
    }

    async fn purge(&self) {
        let keys = match self.kv.list_keys(CACHE_PREFIX).await {
            Ok(keys) => keys,
            Err(e) => {
                log::warn!("cache purge could not list keys: {}", e);
                return;
            }
        };
        for key in keys {
            if let Err(e) = self.kv.remove(&key).await {
                log::warn!("cache purge could not remove {}: {}", key, e);
            }
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", CACHE_PREFIX, key)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::kv::MemoryKvStore;
    use chrono::TimeZone;

    fn cache_with_store(kv: Arc<MemoryKvStore>) -> (TtlCache, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let cache = TtlCache::new(kv, Arc::new(clock.clone()));
        (cache, clock)
    }

    #[tokio::test]
    async fn test_get_within_ttl_returns_payload() {
        let (cache, _clock) = cache_with_store(Arc::new(MemoryKvStore::new()));
        cache.put("trending:1:th", &vec![1, 2, 3]).await;
        assert_eq!(
            cache.get::<Vec<i32>>("trending:1:th").await,
            Some(vec![1, 2, 3])
        );
    }

    #[tokio::test]
    async fn test_get_after_ttl_is_a_miss() {
        let (cache, clock) = cache_with_store(Arc::new(MemoryKvStore::new()));
        cache.put("k", &"v").await;

        clock.advance(Duration::seconds(DEFAULT_TTL_SECS - 1));
        assert_eq!(cache.get::<String>("k").await, Some("v".to_string()));

        clock.advance(Duration::seconds(2));
        assert_eq!(cache.get::<String>("k").await, None);
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_only_cache_entries() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set("dramashelf_history", "[]").await.unwrap();
        let (cache, _clock) = cache_with_store(kv.clone());

        cache.put("a", &1).await;
        cache.put("b", &2).await;
        cache.invalidate_all().await;

        assert_eq!(cache.get::<i32>("a").await, None);
        assert_eq!(cache.get::<i32>("b").await, None);
        // Foreign keys survive the invalidation
        assert_eq!(
            kv.get("dramashelf_history").await.unwrap(),
            Some("[]".to_string())
        );
    }

    #[tokio::test]
    async fn test_full_medium_purges_and_retries() {
        let kv = Arc::new(MemoryKvStore::with_capacity_limit(2));
        let (cache, _clock) = cache_with_store(kv.clone());

        cache.put("a", &1).await;
        cache.put("b", &2).await;
        // Medium is now full; this write must self-heal instead of failing
        cache.put("c", &3).await;

        assert_eq!(cache.get::<i32>("c").await, Some(3));
        assert_eq!(cache.get::<i32>("a").await, None);
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_stored_at() {
        let (cache, clock) = cache_with_store(Arc::new(MemoryKvStore::new()));
        cache.put("k", &"old").await;

        clock.advance(Duration::seconds(DEFAULT_TTL_SECS + 10));
        cache.put("k", &"new").await;
        assert_eq!(cache.get::<String>("k").await, Some("new".to_string()));
    }
}
