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


//! Favorites store
//!
//! A flat list of bookmarked dramas, newest first, persisted as one JSON
//! document in the key-value medium. Display fields are snapshotted at add
//! time so the shelf renders offline. Unlike watch history the list is
//! uncapped; a user curates it explicitly.

use crate::clock::Clock;
use crate::model::FavoriteRecord;
use crate::storage::kv::KvStore;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage key for the serialized favorites list
const FAVORITES_KEY: &str = "dramashelf_favorites";

/// Input to [`FavoritesStore::add`]
#[derive(Debug, Clone)]
pub struct NewFavorite {
    pub drama_id: String,
    pub title: String,
    pub cover_url: String,
    pub total_episodes: u32,
}

/// Persistent favorites store
pub struct FavoritesStore {
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    records: RwLock<Vec<FavoriteRecord>>,
}

impl FavoritesStore {
    /// Open the store, loading any persisted favorites
    ///
    /// A corrupt list is discarded rather than blocking startup.
    pub async fn open(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        let records = match kv.get(FAVORITES_KEY).await {
            Ok(Some(stored)) => match serde_json::from_str::<Vec<FavoriteRecord>>(&stored) {
                Ok(mut records) => {
                    records.sort_by(|a, b| b.added_at.cmp(&a.added_at));
                    records
                }
                Err(e) => {
                    log::warn!("discarding unreadable favorites list: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("could not load favorites: {}", e);
                Vec::new()
            }
        };

        Self {
            kv,
            clock,
            records: RwLock::new(records),
        }
    }

    /// Add a drama; re-adding an existing favorite refreshes its snapshot
    /// and moves it to the front
    pub async fn add(&self, input: NewFavorite) -> FavoriteRecord {
        let record = FavoriteRecord {
            drama_id: input.drama_id,
            title: input.title,
            cover_url: input.cover_url,
            total_episodes: input.total_episodes,
            added_at: self.clock.now(),
        };

        let mut records = self.records.write().await;
        records.retain(|r| r.drama_id != record.drama_id);
        records.insert(0, record.clone());
        self.persist(&records).await;
        record
    }

    /// Remove a favorite; returns whether it existed
    pub async fn remove(&self, drama_id: &str) -> bool {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.drama_id != drama_id);
        let removed = records.len() != before;
        if removed {
            self.persist(&records).await;
        }
        removed
    }

    /// Flip favorite status; returns the new status
    pub async fn toggle(&self, input: NewFavorite) -> bool {
        if self.remove(&input.drama_id).await {
            false
        } else {
            self.add(input).await;
            true
        }
    }

    pub async fn is_favorite(&self, drama_id: &str) -> bool {
        self.records
            .read()
            .await
            .iter()
            .any(|r| r.drama_id == drama_id)
    }

    /// All favorites, newest first
    pub async fn get_all(&self) -> Vec<FavoriteRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn clear(&self) {
        let mut records = self.records.write().await;
        records.clear();
        if let Err(e) = self.kv.remove(FAVORITES_KEY).await {
            log::warn!("could not clear favorites: {}", e);
        }
    }

    /// Best-effort flush; a write failure keeps the in-memory list usable
    async fn persist(&self, records: &[FavoriteRecord]) {
        match serde_json::to_string(records) {
            Ok(serialized) => {
                if let Err(e) = self.kv.set(FAVORITES_KEY, &serialized).await {
                    log::warn!("could not persist favorites: {}", e);
                }
            }
            Err(e) => log::warn!("could not serialize favorites: {}", e),
        }
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
    use chrono::{Duration, TimeZone, Utc};

    fn new_favorite(drama_id: &str) -> NewFavorite {
        NewFavorite {
            drama_id: drama_id.to_string(),
            title: format!("Drama {}", drama_id),
            cover_url: String::new(),
            total_episodes: 60,
        }
    }

    async fn setup() -> (FavoritesStore, Arc<MemoryKvStore>, ManualClock) {
        let kv = Arc::new(MemoryKvStore::new());
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let store = FavoritesStore::open(kv.clone(), Arc::new(clock.clone())).await;
        (store, kv, clock)
    }

    #[tokio::test]
    async fn test_add_and_query() {
        let (store, _kv, clock) = setup().await;
        store.add(new_favorite("A")).await;
        clock.advance(Duration::seconds(60));
        store.add(new_favorite("B")).await;

        assert!(store.is_favorite("A").await);
        assert!(!store.is_favorite("C").await);
        let all = store.get_all().await;
        assert_eq!(all.len(), 2);
        // Newest first
        assert_eq!(all[0].drama_id, "B");
    }

    #[tokio::test]
    async fn test_re_add_moves_to_front_without_duplicating() {
        let (store, _kv, clock) = setup().await;
        store.add(new_favorite("A")).await;
        clock.advance(Duration::seconds(60));
        store.add(new_favorite("B")).await;
        clock.advance(Duration::seconds(60));
        store.add(new_favorite("A")).await;

        let all = store.get_all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].drama_id, "A");
    }

    #[tokio::test]
    async fn test_toggle_flips_status() {
        let (store, _kv, _clock) = setup().await;
        assert!(store.toggle(new_favorite("A")).await);
        assert!(store.is_favorite("A").await);
        assert!(!store.toggle(new_favorite("A")).await);
        assert!(!store.is_favorite("A").await);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (store, kv, _clock) = setup().await;
        store.add(new_favorite("A")).await;
        store.add(new_favorite("B")).await;

        assert!(store.remove("A").await);
        assert!(!store.remove("A").await);
        assert_eq!(store.len().await, 1);

        store.clear().await;
        assert!(store.is_empty().await);
        assert_eq!(kv.get("dramashelf_favorites").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_favorites_survive_reopen() {
        let (store, kv, clock) = setup().await;
        store.add(new_favorite("A")).await;
        clock.advance(Duration::seconds(60));
        store.add(new_favorite("B")).await;
        drop(store);

        let reopened = FavoritesStore::open(kv, Arc::new(clock)).await;
        let all = reopened.get_all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].drama_id, "B");
    }

    #[tokio::test]
    async fn test_corrupt_list_discarded_on_open() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set("dramashelf_favorites", "not json").await.unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let store = FavoritesStore::open(kv, Arc::new(clock)).await;
        assert!(store.is_empty().await);
    }
}
