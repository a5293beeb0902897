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


//! Local persistence
//!
//! Everything that outlives a session goes through the [`kv::KvStore`]
//! abstraction: a small async string key-value contract with an in-memory
//! implementation for tests and a SQLite implementation for devices.
//!
//! On top of it sit the user-state stores, each owning a disjoint key:
//! - `dramashelf_history` - watch progress ([`progress::ProgressStore`])
//! - `dramashelf_favorites` - bookmarks ([`favorites::FavoritesStore`])
//! - `dramashelf_settings` - playback preferences ([`settings::SettingsStore`])
//!
//! The catalog cache shares the same medium under its own key prefix and
//! never touches these keys.
//!
//! # Usage Example
//! ```no_run
//! use drama_core::clock::SystemClock;
//! use drama_core::storage::{ProgressStore, SqliteKvStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kv = Arc::new(SqliteKvStore::open("./dramashelf.db").await?);
//! let progress = ProgressStore::open(kv, Arc::new(SystemClock)).await;
//! let rail = progress.get_continue_watching(10).await;
//! # Ok(())
//! # }
//! ```

pub mod favorites;
pub mod kv;
pub mod progress;
pub mod settings;
pub mod sqlite;

// Re-export commonly used types
pub use favorites::{FavoritesStore, NewFavorite};
pub use kv::{KvError, KvResult, KvStore, MemoryKvStore};
pub use progress::{NewProgress, ProgressChange, ProgressStore, DEFAULT_HISTORY_CAP};
pub use settings::{PlayerSettings, SettingsStore};
pub use sqlite::SqliteKvStore;
