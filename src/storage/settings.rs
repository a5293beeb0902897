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


//! Player settings store
//!
//! A small persisted bag of playback preferences. Missing or corrupt
//! settings fall back to defaults; settings must never block playback.

use crate::model::QualityTier;
use crate::storage::kv::KvStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage key for the serialized settings document
const SETTINGS_KEY: &str = "dramashelf_settings";

/// Playback preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerSettings {
    /// Preferred stream quality handed to the variant selector
    pub video_quality: QualityTier,
    /// Start playback as soon as an episode loads
    pub auto_play: bool,
    /// Advance to the next episode when one finishes
    pub auto_next: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            video_quality: QualityTier::Pixels(720),
            auto_play: true,
            auto_next: true,
        }
    }
}

/// Persistent settings store
pub struct SettingsStore {
    kv: Arc<dyn KvStore>,
    settings: RwLock<PlayerSettings>,
}

impl SettingsStore {
    /// Open the store, loading persisted settings or defaults
    pub async fn open(kv: Arc<dyn KvStore>) -> Self {
        let settings = match kv.get(SETTINGS_KEY).await {
            Ok(Some(stored)) => match serde_json::from_str::<PlayerSettings>(&stored) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("discarding unreadable settings, using defaults: {}", e);
                    PlayerSettings::default()
                }
            },
            Ok(None) => PlayerSettings::default(),
            Err(e) => {
                log::warn!("could not load settings, using defaults: {}", e);
                PlayerSettings::default()
            }
        };

        Self {
            kv,
            settings: RwLock::new(settings),
        }
    }

    pub async fn get(&self) -> PlayerSettings {
        self.settings.read().await.clone()
    }

    /// Replace all settings
    pub async fn save(&self, settings: PlayerSettings) {
        {
            let mut current = self.settings.write().await;
            *current = settings.clone();
        }
        self.persist(&settings).await;
    }

    pub async fn video_quality(&self) -> QualityTier {
        self.settings.read().await.video_quality
    }

    pub async fn set_video_quality(&self, quality: QualityTier) {
        let settings = {
            let mut current = self.settings.write().await;
            current.video_quality = quality;
            current.clone()
        };
        self.persist(&settings).await;
    }

    pub async fn set_auto_play(&self, auto_play: bool) {
        let settings = {
            let mut current = self.settings.write().await;
            current.auto_play = auto_play;
            current.clone()
        };
        self.persist(&settings).await;
    }

    pub async fn set_auto_next(&self, auto_next: bool) {
        let settings = {
            let mut current = self.settings.write().await;
            current.auto_next = auto_next;
            current.clone()
        };
        self.persist(&settings).await;
    }

    /// Reset to defaults and drop the persisted document
    pub async fn reset(&self) {
        {
            let mut current = self.settings.write().await;
            *current = PlayerSettings::default();
        }
        if let Err(e) = self.kv.remove(SETTINGS_KEY).await {
            log::warn!("could not clear settings: {}", e);
        }
    }

    /// Best-effort flush; a write failure keeps the session settings usable
    async fn persist(&self, settings: &PlayerSettings) {
        match serde_json::to_string(settings) {
            Ok(serialized) => {
                if let Err(e) = self.kv.set(SETTINGS_KEY, &serialized).await {
                    log::warn!("could not persist settings: {}", e);
                }
            }
            Err(e) => log::warn!("could not serialize settings: {}", e),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryKvStore;

    async fn setup() -> (SettingsStore, Arc<MemoryKvStore>) {
        let kv = Arc::new(MemoryKvStore::new());
        let store = SettingsStore::open(kv.clone()).await;
        (store, kv)
    }

    #[tokio::test]
    async fn test_defaults_when_nothing_persisted() {
        let (store, _kv) = setup().await;
        let settings = store.get().await;
        assert_eq!(settings.video_quality, QualityTier::Pixels(720));
        assert!(settings.auto_play);
        assert!(settings.auto_next);
    }

    #[tokio::test]
    async fn test_settings_survive_reopen() {
        let (store, kv) = setup().await;
        store.set_video_quality(QualityTier::Pixels(1080)).await;
        store.set_auto_next(false).await;
        drop(store);

        let reopened = SettingsStore::open(kv).await;
        let settings = reopened.get().await;
        assert_eq!(settings.video_quality, QualityTier::Pixels(1080));
        assert!(settings.auto_play);
        assert!(!settings.auto_next);
    }

    #[tokio::test]
    async fn test_corrupt_document_falls_back_to_defaults() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set("dramashelf_settings", "{broken").await.unwrap();
        let store = SettingsStore::open(kv).await;
        assert_eq!(store.get().await, PlayerSettings::default());
    }

    #[tokio::test]
    async fn test_missing_fields_take_defaults() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set("dramashelf_settings", r#"{"autoPlay":false}"#)
            .await
            .unwrap();
        let store = SettingsStore::open(kv).await;
        let settings = store.get().await;
        assert!(!settings.auto_play);
        assert_eq!(settings.video_quality, QualityTier::Pixels(720));
        assert!(settings.auto_next);
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let (store, kv) = setup().await;
        store
            .save(PlayerSettings {
                video_quality: QualityTier::Pixels(480),
                auto_play: false,
                auto_next: false,
            })
            .await;
        store.reset().await;
        assert_eq!(store.get().await, PlayerSettings::default());
        assert_eq!(kv.get("dramashelf_settings").await.unwrap(), None);
    }
}
