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


//! Error types for the DramaShelf core
//!
//! This module defines error types using thiserror for ergonomic error
//! handling. The taxonomy matters to callers:
//!
//! - **Transient fetch failures** (`FetchFailed`, `InvalidResponse`) are
//!   retryable by caller action and are never cached.
//! - **`NotFound`** means the fallback chain was exhausted; the UI shows an
//!   empty state instead of a retry prompt, so it must stay distinguishable
//!   from a transient failure.
//! - **Storage write failures** on the size-bounded key-value medium are
//!   recovered locally (purge-and-retry in the cache, oldest-eviction in the
//!   progress store) and never reach this enum from those paths.
//! - An unplayable episode is a sentinel (`None` from the stream selector),
//!   not an error.

use thiserror::Error;

/// Result type alias using our DramaCoreError type
pub type Result<T> = std::result::Result<T, DramaCoreError>;

/// Main error type for the DramaShelf core
#[derive(Error, Debug)]
pub enum DramaCoreError {
    // ===== Catalog fetch errors (transient) =====

    /// Upstream request failed (network error, timeout, or non-2xx status)
    #[error("catalog request failed: {message}")]
    FetchFailed {
        message: String,
        /// HTTP status code if the server answered
        status_code: Option<u16>,
        /// Endpoint path that failed
        endpoint: Option<String>,
    },

    /// Upstream answered but the payload could not be parsed
    #[error("invalid catalog response: {message}")]
    InvalidResponse { message: String },

    // ===== Lookup errors (terminal) =====

    /// Every step of the fallback chain missed; the id does not exist in any
    /// catalog we know about
    #[error("drama not found in any catalog: {drama_id}")]
    NotFound { drama_id: String },

    // ===== Storage errors =====

    /// Persistent key-value medium failed outside the locally recovered
    /// capacity paths (corrupt database, closed pool)
    #[error("storage error: {0}")]
    Storage(String),

    // ===== Caller errors =====

    /// Caller passed input the operation cannot work with
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // ===== Automatic conversions =====

    /// HTTP transport error from reqwest
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error from sqlx
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl DramaCoreError {
    /// Create a FetchFailed error with context
    pub fn fetch_failed(
        message: impl Into<String>,
        status_code: Option<u16>,
        endpoint: Option<String>,
    ) -> Self {
        DramaCoreError::FetchFailed {
            message: message.into(),
            status_code,
            endpoint,
        }
    }

    /// Create an InvalidResponse error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        DramaCoreError::InvalidResponse {
            message: message.into(),
        }
    }

    /// Is this a transient fetch failure the caller may retry?
    ///
    /// `NotFound` deliberately answers false: retrying an exhausted fallback
    /// chain will not make the drama appear.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DramaCoreError::FetchFailed { .. }
                | DramaCoreError::InvalidResponse { .. }
                | DramaCoreError::Transport(_)
        )
    }

    /// Is this the exhausted-fallback-chain outcome?
    pub fn is_not_found(&self) -> bool {
        matches!(self, DramaCoreError::NotFound { .. })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let fetch = DramaCoreError::fetch_failed("timeout", None, Some("/trending".to_string()));
        assert!(fetch.is_transient());
        assert!(!fetch.is_not_found());

        let not_found = DramaCoreError::NotFound {
            drama_id: "41000104686".to_string(),
        };
        assert!(!not_found.is_transient());
        assert!(not_found.is_not_found());
    }

    #[test]
    fn test_fetch_failed_message_includes_context() {
        let err = DramaCoreError::fetch_failed("HTTP 502", Some(502), Some("/latest".to_string()));
        assert!(err.to_string().contains("HTTP 502"));
    }
}
