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


//! Catalog and playback core for a short-drama streaming client
//!
//! This crate is the headless half of the application: it talks to the
//! upstream catalog service, normalizes its inconsistent payloads into one
//! canonical model, caches responses, resolves dramas that the detail
//! endpoint cannot serve, picks a playable stream variant, and persists
//! watch progress, favorites, and player settings locally. The presentation
//! layer renders what comes out of here and never sees a raw payload.
//!
//! # Layout
//! - [`api`] - transport, normalizer, cached catalog client, resolver,
//!   stream selection
//! - [`cache`] - TTL cache over the key-value medium
//! - [`storage`] - key-value abstraction plus progress/favorites/settings
//! - [`model`] - canonical records shared by all of the above
//! - [`clock`] - injectable time source so TTL and recency are testable
//! - [`error`] - the crate-wide error type

pub mod api;
pub mod cache;
pub mod clock;
pub mod error;
pub mod model;
pub mod storage;

// Re-export the types most callers need
pub use api::{
    resolve, resolve_with_episodes, select_best_url, Catalog, CatalogTransport, ClientConfig,
    Facet, HttpTransport, Locale,
};
pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DramaCoreError, Result};
pub use model::{
    CdnGroup, Drama, Episode, FavoriteRecord, ProgressRecord, QualityTier, StreamVariant, Tag,
};
pub use storage::{
    FavoritesStore, KvStore, MemoryKvStore, NewFavorite, NewProgress, PlayerSettings,
    ProgressChange, ProgressStore, SettingsStore, SqliteKvStore,
};
