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


//! Persistent key-value collaborator
//!
//! The TTL cache and every user-state store write through this seam. The
//! medium is assumed size-bounded (browser-local storage, mobile app
//! preferences), which is why [`KvError::CapacityExceeded`] is a distinct
//! variant: callers recover from it locally (purge or evict, then retry)
//! instead of surfacing it.
//!
//! [`MemoryKvStore`] is the in-process implementation used by tests and
//! ephemeral sessions; [`super::sqlite::SqliteKvStore`] is the durable one.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors from the key-value medium
#[derive(Error, Debug)]
pub enum KvError {
    /// The medium is full; the write may succeed after the caller frees space
    #[error("key-value store capacity exceeded")]
    CapacityExceeded,

    /// Any other backend failure
    #[error("key-value store error: {0}")]
    Backend(String),
}

/// Result alias for key-value operations
pub type KvResult<T> = std::result::Result<T, KvError>;

/// Minimal string-to-string persistent store
///
/// Values are JSON-serialized records; keys are namespaced by the owning
/// component (`dramashelf_cache:*`, `dramashelf_history`, ...) so one
/// component's bulk operations never touch another's entries.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> KvResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> KvResult<()>;
    async fn remove(&self, key: &str) -> KvResult<()>;
    /// All keys starting with `prefix`, in stable (sorted) order
    async fn list_keys(&self, prefix: &str) -> KvResult<Vec<String>>;
}

/// In-memory key-value store
///
/// `max_entries` caps the number of distinct keys to model the bounded
/// medium; overwriting an existing key always succeeds.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, String>>,
    max_entries: Option<usize>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that refuses new keys beyond `max_entries`
    pub fn with_capacity_limit(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: Some(max_entries),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        let mut entries = self.entries.write().await;
        if let Some(max) = self.max_entries {
            if !entries.contains_key(key) && entries.len() >= max {
                return Err(KvError::CapacityExceeded);
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> KvResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> KvResult<Vec<String>> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove_roundtrip() {
        let store = MemoryKvStore::new();
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some("1".to_string()));

        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
        // Removing a missing key is not an error
        store.remove("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_keys_filters_by_prefix_and_sorts() {
        let store = MemoryKvStore::new();
        store.set("cache:b", "1").await.unwrap();
        store.set("cache:a", "2").await.unwrap();
        store.set("history", "3").await.unwrap();

        let keys = store.list_keys("cache:").await.unwrap();
        assert_eq!(keys, vec!["cache:a".to_string(), "cache:b".to_string()]);
    }

    #[tokio::test]
    async fn test_capacity_limit_rejects_new_keys_but_allows_overwrite() {
        let store = MemoryKvStore::with_capacity_limit(1);
        store.set("a", "1").await.unwrap();

        assert!(matches!(
            store.set("b", "2").await,
            Err(KvError::CapacityExceeded)
        ));
        // Overwriting in place must still work on a full medium
        store.set("a", "3").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some("3".to_string()));
    }
}
