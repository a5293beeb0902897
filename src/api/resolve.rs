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


//! Fallback drama resolver
//!
//! The detail endpoint is unreliable: depending on deployment it returns the
//! drama, only its episode list, or nothing useful. When a caller holds a
//! drama id (deep link, history entry) the resolver locates the record by
//! scanning secondary catalogs in a fixed priority order:
//!
//! 1. the detail endpoint itself, when it embeds the drama;
//! 2. the first page of the home catalog (largest result set);
//! 3. the recommended catalog;
//! 4. the VIP catalog, nested groupings flattened.
//!
//! The first match wins and stops the chain. Ids are compared as strings
//! regardless of the numeric/string typing upstream chose. Every lookup
//! routes through the catalog client and therefore inherits its caching.
//!
//! `NotFound` is only produced after the whole chain misses; a transport
//! failure while scanning a secondary catalog propagates as a transient
//! error instead, so the UI can tell "does not exist" from "try again".

use crate::api::catalog::{Catalog, HOME_FALLBACK_PAGE_SIZE};
use crate::error::{DramaCoreError, Result};
use crate::model::{Drama, Episode};

/// Locate a drama by id across the fallback chain
pub async fn resolve(catalog: &Catalog, drama_id: &str) -> Result<Drama> {
    if drama_id.is_empty() {
        return Err(DramaCoreError::InvalidInput("empty drama id".to_string()));
    }

    // (a) Detail endpoint. A transient failure here does not doom the
    // lookup; the secondary catalogs may still know the id.
    match catalog.detail(drama_id).await {
        Ok(payload) => {
            if let Some(drama) = payload.drama {
                return Ok(drama);
            }
            log::debug!("detail for {} had no drama record, trying fallbacks", drama_id);
        }
        Err(e) => {
            log::warn!("detail lookup for {} failed ({}), trying fallbacks", drama_id, e);
        }
    }

    // (b) Home catalog, first page with a large size
    let home = catalog.home(1, HOME_FALLBACK_PAGE_SIZE).await?;
    if let Some(drama) = find_by_id(home, drama_id) {
        return Ok(drama);
    }

    // (c) Recommended catalog
    let recommend = catalog.recommend().await?;
    if let Some(drama) = find_by_id(recommend, drama_id) {
        return Ok(drama);
    }

    // (d) VIP catalog (already flattened by the client)
    let vip = catalog.vip().await?;
    if let Some(drama) = find_by_id(vip, drama_id) {
        return Ok(drama);
    }

    Err(DramaCoreError::NotFound {
        drama_id: drama_id.to_string(),
    })
}

/// Resolve a drama together with its episode list
///
/// Detail pages need both halves; this reuses whatever the detail endpoint
/// embedded and fills the gaps from the chain and the episode endpoint.
pub async fn resolve_with_episodes(
    catalog: &Catalog,
    drama_id: &str,
) -> Result<(Drama, Vec<Episode>)> {
    if drama_id.is_empty() {
        return Err(DramaCoreError::InvalidInput("empty drama id".to_string()));
    }

    let mut embedded_episodes: Vec<Episode> = Vec::new();
    let mut drama: Option<Drama> = None;

    match catalog.detail(drama_id).await {
        Ok(payload) => {
            embedded_episodes = payload.episodes;
            drama = payload.drama;
        }
        Err(e) => {
            log::warn!("detail lookup for {} failed ({}), trying fallbacks", drama_id, e);
        }
    }

    let drama = match drama {
        Some(drama) => drama,
        None => resolve(catalog, drama_id).await?,
    };

    let episodes = if embedded_episodes.is_empty() {
        catalog.episodes(drama_id).await?
    } else {
        embedded_episodes
    };

    Ok((drama, episodes))
}

/// String-equality id match, first occurrence
fn find_by_id(dramas: Vec<Drama>, drama_id: &str) -> Option<Drama> {
    dramas.into_iter().find(|d| d.id == drama_id)
}

// ============================================================================
// TESTS
// ============================================================================
