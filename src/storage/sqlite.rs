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


//! SQLite-backed key-value store
//!
//! Durable implementation of [`KvStore`] for desktop/mobile shells, one
//! table keyed by the namespaced keys the stores already use.
//!
//! # SQLite Configuration
//! - WAL mode for better concurrency
//! - Normal synchronous mode (balance safety/speed)
//! - 30 s busy timeout; statement logging disabled

use crate::storage::kv::{KvError, KvResult, KvStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    ConnectOptions,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// SQLITE_FULL primary result code
const SQLITE_FULL: &str = "13";

/// Key-value store persisted in a single SQLite table
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    /// Open (or create) the store at `database_path`
    ///
    /// # Errors
    /// Returns `KvError::Backend` if the parent directory cannot be created
    /// or the database cannot be opened.
    pub async fn open<P: AsRef<Path>>(database_path: P) -> KvResult<Self> {
        let path = database_path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    KvError::Backend(format!(
                        "failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let connection_string = format!("sqlite://{}?mode=rwc", path.display());
        let mut connect_opts = SqliteConnectOptions::from_str(&connection_string)
            .map_err(backend_err)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));
        connect_opts = connect_opts.disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(connect_opts)
            .await
            .map_err(backend_err)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// In-memory store for tests
    pub async fn open_in_memory() -> KvResult<Self> {
        let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(backend_err)?;

        // A single connection keeps every query on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_opts)
            .await
            .map_err(backend_err)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> KvResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(backend_err)?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM kv WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> KvResult<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> KvResult<Vec<String>> {
        let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT key FROM kv WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(keys)
    }
}

fn backend_err<E: std::fmt::Display>(e: E) -> KvError {
    KvError::Backend(e.to_string())
}

/// A full database reports SQLITE_FULL; callers treat that as the
/// recoverable capacity case
fn map_sqlx_err(e: sqlx::Error) -> KvError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some(SQLITE_FULL) {
            return KvError::CapacityExceeded;
        }
    }
    KvError::Backend(e.to_string())
}

// ============================================================================
// TESTS
// ============================================================================
