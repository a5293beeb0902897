//! Integration test for the SQLite-backed user state stores
//!
//! Runs the progress, favorites, and settings stores plus the catalog cache
//! against a real SQLite file and checks they share the medium without
//! clobbering each other across reopen.

use drama_core::api::{Facet, Locale};
use drama_core::cache::TtlCache;
use drama_core::clock::{ManualClock, SystemClock};
use drama_core::model::QualityTier;
use drama_core::storage::{
    FavoritesStore, KvStore, NewFavorite, NewProgress, ProgressStore, SettingsStore, SqliteKvStore,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;

fn new_progress(drama_id: &str, position: f64, duration: f64) -> NewProgress {
    NewProgress {
        drama_id: drama_id.to_string(),
        episode_ordinal: 0,
        episode_name: None,
        position_seconds: position,
        duration_seconds: duration,
        total_episodes: 40,
        title: format!("Drama {}", drama_id),
        cover_url: format!("https://cdn.example/{}.jpg", drama_id),
    }
}

#[tokio::test]
async fn test_user_state_survives_reopen_on_disk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("dramashelf.db");
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());

    {
        let kv: Arc<dyn KvStore> = Arc::new(SqliteKvStore::open(&db_path).await?);

        let progress = ProgressStore::open(kv.clone(), Arc::new(clock.clone())).await;
        progress.save(new_progress("d1", 120.0, 1200.0)).await;
        clock.advance(Duration::seconds(60));
        progress.save(new_progress("d2", 30.0, 900.0)).await;

        let favorites = FavoritesStore::open(kv.clone(), Arc::new(clock.clone())).await;
        favorites
            .add(NewFavorite {
                drama_id: "d1".to_string(),
                title: "Drama d1".to_string(),
                cover_url: String::new(),
                total_episodes: 40,
            })
            .await;

        let settings = SettingsStore::open(kv.clone()).await;
        settings.set_video_quality(QualityTier::Pixels(1080)).await;
    }

    // Fresh connections against the same file
    let kv: Arc<dyn KvStore> = Arc::new(SqliteKvStore::open(&db_path).await?);

    let progress = ProgressStore::open(kv.clone(), Arc::new(clock.clone())).await;
    let all = progress.get_all().await;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].drama_id, "d2");
    let rail = progress.get_continue_watching(10).await;
    assert_eq!(rail.len(), 2);

    let favorites = FavoritesStore::open(kv.clone(), Arc::new(clock)).await;
    assert!(favorites.is_favorite("d1").await);
    assert!(!favorites.is_favorite("d2").await);

    let settings = SettingsStore::open(kv).await;
    assert_eq!(settings.video_quality().await, QualityTier::Pixels(1080));

    Ok(())
}

#[tokio::test]
async fn test_cache_invalidation_leaves_user_state_alone() -> Result<(), Box<dyn std::error::Error>>
{
    let kv: Arc<dyn KvStore> = Arc::new(SqliteKvStore::open_in_memory().await?);
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());

    let progress = ProgressStore::open(kv.clone(), Arc::new(clock.clone())).await;
    progress.save(new_progress("d1", 120.0, 1200.0)).await;

    let cache = TtlCache::new(kv.clone(), Arc::new(clock.clone()));
    let facet = Facet::Trending { page: 1 };
    cache
        .put(&facet.cache_key(Locale::Th), &json!([{ "id": "1" }]))
        .await;

    // Wiping the catalog cache must not touch history keys
    cache.invalidate_all().await;
    assert!(cache
        .get::<serde_json::Value>(&facet.cache_key(Locale::Th))
        .await
        .is_none());

    let reopened = ProgressStore::open(kv, Arc::new(clock)).await;
    assert_eq!(reopened.len().await, 1);

    Ok(())
}

#[tokio::test]
async fn test_completion_threshold_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let kv: Arc<dyn KvStore> = Arc::new(SqliteKvStore::open_in_memory().await?);
    let progress = ProgressStore::open(kv, Arc::new(SystemClock)).await;

    progress.save(new_progress("binge", 100.0, 1200.0)).await;
    assert_eq!(progress.get_continue_watching(10).await.len(), 1);

    // Checkpoint past 95% completes the drama and clears the rail
    progress.update_progress("binge", 1180.0, 1200.0).await;
    assert!(progress.get_continue_watching(10).await.is_empty());

    let record = progress.get("binge").await.expect("record kept as history");
    assert!(record.is_completed());
    assert!(record.progress_percent() > 95);

    Ok(())
}
