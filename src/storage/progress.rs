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


//! Watch-progress store
//!
//! Persists per-drama watch position across sessions so playback can resume
//! and the continue-watching rail can be derived. One record per drama id,
//! latest write wins; the list is kept most-recently-watched first and
//! capped (default 50), evicting the least recently watched.
//!
//! Per drama the lifecycle is: unstarted → first `save` → in-progress →
//! position/duration ≥ 0.95 → completed. Completed records leave the
//! continue-watching rail but remain queryable as history; explicit removal
//! returns a drama to unstarted.
//!
//! Every mutation emits a [`ProgressChange`] on a broadcast channel so the
//! presentation layer reacts without polling. Write failures on the bounded
//! medium are recovered by evicting the oldest record and retrying; they
//! never surface to callers.

use crate::clock::Clock;
use crate::model::ProgressRecord;
use crate::storage::kv::{KvError, KvStore};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Maximum records kept (least-recently-watched evicted beyond this)
pub const DEFAULT_HISTORY_CAP: usize = 50;

/// Storage key for the serialized history list
const HISTORY_KEY: &str = "dramashelf_history";

/// Broadcast channel capacity; a lagging subscriber only loses old
/// notifications, not state
const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// Change notification emitted by every mutating operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressChange {
    Saved { drama_id: String },
    Updated { drama_id: String },
    Removed { drama_id: String },
    Cleared,
}

/// Input to [`ProgressStore::save`]
///
/// Display fields are snapshotted onto the stored record so history renders
/// without refetching catalog data.
#[derive(Debug, Clone)]
pub struct NewProgress {
    pub drama_id: String,
    pub episode_ordinal: usize,
    /// Defaults to "Episode {ordinal+1}" when the caller has no name
    pub episode_name: Option<String>,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub total_episodes: u32,
    pub title: String,
    pub cover_url: String,
}

/// Persistent watch-progress store
///
/// Sole writer of progress records. The working copy lives in memory,
/// most-recently-watched first, and is flushed to the key-value medium on
/// every mutation.
pub struct ProgressStore {
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    cap: usize,
    records: RwLock<Vec<ProgressRecord>>,
    changes: broadcast::Sender<ProgressChange>,
}

impl ProgressStore {
    /// Open the store, loading any persisted history
    ///
    /// An unreadable or corrupt history is discarded and replaced on the
    /// next write; losing best-effort history is better than refusing to
    /// start.
    pub async fn open(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_cap(kv, clock, DEFAULT_HISTORY_CAP).await
    }

    pub async fn with_cap(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>, cap: usize) -> Self {
        let records = match kv.get(HISTORY_KEY).await {
            Ok(Some(stored)) => match serde_json::from_str::<Vec<ProgressRecord>>(&stored) {
                Ok(mut records) => {
                    records.sort_by(|a, b| b.last_watched_at.cmp(&a.last_watched_at));
                    records.truncate(cap);
                    records
                }
                Err(e) => {
                    log::warn!("discarding unreadable watch history: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("could not load watch history: {}", e);
                Vec::new()
            }
        };

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            kv,
            clock,
            cap,
            records: RwLock::new(records),
            changes,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressChange> {
        self.changes.subscribe()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Upsert a record and move it to the most-recently-watched position
    ///
    /// Entries beyond the cap are evicted, least recently watched first.
    /// Returns the stored record.
    pub async fn save(&self, input: NewProgress) -> ProgressRecord {
        let duration = input.duration_seconds.max(0.0);
        let record = ProgressRecord {
            episode_name: input
                .episode_name
                .unwrap_or_else(|| format!("Episode {}", input.episode_ordinal + 1)),
            drama_id: input.drama_id,
            episode_ordinal: input.episode_ordinal,
            position_seconds: clamp_position(input.position_seconds, duration),
            duration_seconds: duration,
            total_episodes: input.total_episodes,
            title: input.title,
            cover_url: input.cover_url,
            last_watched_at: self.clock.now(),
        };

        {
            let mut records = self.records.write().await;
            records.retain(|r| r.drama_id != record.drama_id);
            records.insert(0, record.clone());
            // Eviction goes by watch recency, not list position:
            // update_progress refreshes timestamps without reordering
            while records.len() > self.cap {
                evict_least_recently_watched(&mut records);
            }
            self.persist(&mut records).await;
        }

        self.notify(ProgressChange::Saved {
            drama_id: record.drama_id.clone(),
        });
        record
    }

    /// Update position/duration/timestamp of an existing record
    ///
    /// A drama without a prior `save` is silently ignored; checkpoint ticks
    /// may race an eviction and must not resurrect records. Does not change
    /// the recency order.
    pub async fn update_progress(&self, drama_id: &str, position: f64, duration: f64) {
        let updated = {
            let mut records = self.records.write().await;
            let now = self.clock.now();
            let found = match records.iter_mut().find(|r| r.drama_id == drama_id) {
                Some(record) => {
                    record.duration_seconds = duration.max(0.0);
                    record.position_seconds = clamp_position(position, record.duration_seconds);
                    record.last_watched_at = now;
                    true
                }
                None => false,
            };
            if found {
                self.persist(&mut records).await;
            }
            found
        };

        if updated {
            self.notify(ProgressChange::Updated {
                drama_id: drama_id.to_string(),
            });
        } else {
            log::debug!("progress tick for unknown drama {} ignored", drama_id);
        }
    }

    /// Delete one record; returns whether it existed
    pub async fn remove(&self, drama_id: &str) -> bool {
        let removed = {
            let mut records = self.records.write().await;
            let before = records.len();
            records.retain(|r| r.drama_id != drama_id);
            let removed = records.len() != before;
            if removed {
                self.persist(&mut records).await;
            }
            removed
        };

        if removed {
            self.notify(ProgressChange::Removed {
                drama_id: drama_id.to_string(),
            });
        }
        removed
    }

    /// Delete all history
    pub async fn clear(&self) {
        {
            let mut records = self.records.write().await;
            records.clear();
            if let Err(e) = self.kv.remove(HISTORY_KEY).await {
                log::warn!("could not clear watch history: {}", e);
            }
        }
        self.notify(ProgressChange::Cleared);
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub async fn get(&self, drama_id: &str) -> Option<ProgressRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.drama_id == drama_id)
            .cloned()
    }

    /// All records, most recently watched first
    pub async fn get_all(&self) -> Vec<ProgressRecord> {
        self.records.read().await.clone()
    }

    /// Records with partial, non-terminal progress, most recent first
    pub async fn get_continue_watching(&self, limit: usize) -> Vec<ProgressRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.position_seconds > 0.0 && !r.is_completed())
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    /// Flush the working copy, shrinking it on a full medium
    ///
    /// On `CapacityExceeded` the least recently watched record is evicted
    /// and the write retried until it fits or one record remains. Failure
    /// never escapes; history is best-effort by contract.
    async fn persist(&self, records: &mut Vec<ProgressRecord>) {
        loop {
            let serialized = match serde_json::to_string(&*records) {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("could not serialize watch history: {}", e);
                    return;
                }
            };
            match self.kv.set(HISTORY_KEY, &serialized).await {
                Ok(()) => return,
                Err(KvError::CapacityExceeded) if records.len() > 1 => {
                    let evicted = evict_least_recently_watched(records);
                    log::warn!(
                        "history medium full, evicted {:?} and retrying",
                        evicted.map(|r| r.drama_id)
                    );
                }
                Err(e) => {
                    log::warn!("could not persist watch history: {}", e);
                    return;
                }
            }
        }
    }

    fn notify(&self, change: ProgressChange) {
        // No subscribers is fine
        let _ = self.changes.send(change);
    }
}

/// Remove the record with the minimum `last_watched_at`
fn evict_least_recently_watched(records: &mut Vec<ProgressRecord>) -> Option<ProgressRecord> {
    let index = records
        .iter()
        .enumerate()
        .min_by_key(|(_, r)| r.last_watched_at)
        .map(|(i, _)| i)?;
    Some(records.remove(index))
}

fn clamp_position(position: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        position.clamp(0.0, duration)
    } else {
        position.max(0.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
