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


//! Catalog client
//!
//! One operation per upstream facet, every one of them routed the same way:
//! build the locale-scoped cache key, consult the TTL cache, on miss fetch
//! through the transport, normalize before any consumer sees the data, store
//! the canonical result, return it.
//!
//! Fetch/parse failures propagate as typed errors and leave the cache
//! unmodified (no negative caching). The multi-page aggregator is the only
//! fan-out in the crate: it joins all page futures, substitutes an empty
//! page for any failure, and deduplicates by drama id keeping the first
//! occurrence in page order.

use crate::api::client::{CatalogTransport, Facet, Locale};
use crate::api::normalize::{
    self, flatten_vip_columns, normalize_episode_list, normalize_list, DetailPayload,
};
use crate::cache::TtlCache;
use crate::error::Result;
use crate::model::{Drama, Episode};
use futures_util::future::join_all;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Page size used when scanning the home catalog as a fallback source
pub const HOME_FALLBACK_PAGE_SIZE: u32 = 50;

/// Default page fan-out for shelf builders
pub const DEFAULT_SHELF_PAGES: u32 = 3;

/// Catalog client: facets in, canonical records out
///
/// The sole writer of TTL cache entries. Shared freely via `Arc`; all
/// methods take `&self`.
pub struct Catalog {
    transport: Arc<dyn CatalogTransport>,
    cache: TtlCache,
    locale: RwLock<Locale>,
}

impl Catalog {
    pub fn new(transport: Arc<dyn CatalogTransport>, cache: TtlCache) -> Self {
        Self::with_locale(transport, cache, Locale::default())
    }

    pub fn with_locale(
        transport: Arc<dyn CatalogTransport>,
        cache: TtlCache,
        locale: Locale,
    ) -> Self {
        Self {
            transport,
            cache,
            locale: RwLock::new(locale),
        }
    }

    /// Currently active content locale
    pub async fn locale(&self) -> Locale {
        *self.locale.read().await
    }

    /// Switch locale and drop every cached payload
    ///
    /// Payloads are locale-specific; entries from in-flight requests of the
    /// old locale may still land afterwards, but they land under old-locale
    /// keys and are simply never consumed.
    pub async fn set_locale(&self, locale: Locale) {
        {
            let mut active = self.locale.write().await;
            if *active == locale {
                return;
            }
            *active = locale;
        }
        log::debug!("locale switched to {}, invalidating cache", locale);
        self.cache.invalidate_all().await;
    }

    // ========================================================================
    // SHELF FACETS
    // ========================================================================

    pub async fn trending(&self, page: u32) -> Result<Vec<Drama>> {
        self.fetch_dramas(Facet::Trending { page }).await
    }

    pub async fn latest(&self, page: u32) -> Result<Vec<Drama>> {
        self.fetch_dramas(Facet::Latest { page }).await
    }

    pub async fn for_you(&self, page: u32) -> Result<Vec<Drama>> {
        self.fetch_dramas(Facet::ForYou { page }).await
    }

    pub async fn hot(&self, page: u32) -> Result<Vec<Drama>> {
        self.fetch_dramas(Facet::Hot { page }).await
    }

    pub async fn completed(&self, page: u32) -> Result<Vec<Drama>> {
        self.fetch_dramas(Facet::Completed { page }).await
    }

    pub async fn category(&self, name: &str, page: u32) -> Result<Vec<Drama>> {
        self.fetch_dramas(Facet::Category {
            name: name.to_string(),
            page,
        })
        .await
    }

    /// Full-text search; a blank query short-circuits to an empty list
    /// without touching upstream
    pub async fn search(&self, query: &str) -> Result<Vec<Drama>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_dramas(Facet::Search {
            query: query.to_string(),
        })
        .await
    }

    // ========================================================================
    // SECONDARY CATALOGS (fallback sources)
    // ========================================================================

    pub async fn home(&self, page: u32, size: u32) -> Result<Vec<Drama>> {
        self.fetch_dramas(Facet::Home { page, size }).await
    }

    pub async fn recommend(&self) -> Result<Vec<Drama>> {
        self.fetch_dramas(Facet::Recommend).await
    }

    /// VIP catalog, with its nested category groupings already flattened
    pub async fn vip(&self) -> Result<Vec<Drama>> {
        let locale = self.locale().await;
        let facet = Facet::Vip;
        let key = facet.cache_key(locale);

        if let Some(cached) = self.cache.get::<Vec<Drama>>(&key).await {
            return Ok(cached);
        }
        let raw = self.transport.fetch(&facet, locale).await?;
        let dramas = flatten_vip_columns(&raw);
        self.cache.put(&key, &dramas).await;
        Ok(dramas)
    }

    // ========================================================================
    // DETAIL / EPISODES
    // ========================================================================

    pub async fn detail(&self, drama_id: &str) -> Result<DetailPayload> {
        let locale = self.locale().await;
        let facet = Facet::Detail {
            drama_id: drama_id.to_string(),
        };
        let key = facet.cache_key(locale);

        if let Some(cached) = self.cache.get::<DetailPayload>(&key).await {
            return Ok(cached);
        }
        let raw = self.transport.fetch(&facet, locale).await?;
        let payload = normalize::normalize_detail(&raw, drama_id);
        self.cache.put(&key, &payload).await;
        Ok(payload)
    }

    /// Every episode of a drama, ordinals dense and 0-based in list order
    pub async fn episodes(&self, drama_id: &str) -> Result<Vec<Episode>> {
        let locale = self.locale().await;
        let facet = Facet::Episodes {
            drama_id: drama_id.to_string(),
        };
        let key = facet.cache_key(locale);

        if let Some(cached) = self.cache.get::<Vec<Episode>>(&key).await {
            return Ok(cached);
        }
        let raw = self.transport.fetch(&facet, locale).await?;
        let episodes = normalize_episode_list(&raw, drama_id);
        self.cache.put(&key, &episodes).await;
        Ok(episodes)
    }

    // ========================================================================
    // MULTI-PAGE AGGREGATION
    // ========================================================================

    /// Fetch pages `1..=pages` concurrently and merge them
    ///
    /// A failed page becomes an empty page (logged), never a failed
    /// aggregation. Results concatenate in page order and deduplicate by
    /// drama id, first occurrence kept.
    pub async fn fetch_pages<F, Fut>(&self, pages: u32, fetch: F) -> Vec<Drama>
    where
        F: Fn(u32) -> Fut,
        Fut: Future<Output = Result<Vec<Drama>>>,
    {
        let results = join_all((1..=pages).map(&fetch)).await;

        let mut seen: HashSet<String> = HashSet::new();
        let mut merged = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(dramas) => {
                    for drama in dramas {
                        if seen.insert(drama.id.clone()) {
                            merged.push(drama);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("aggregation dropped page {}: {}", index + 1, e);
                }
            }
        }
        merged
    }

    /// Multi-page trending shelf
    pub async fn trending_shelf(&self, pages: u32) -> Vec<Drama> {
        self.fetch_pages(pages, |p| self.trending(p)).await
    }

    /// Multi-page latest shelf
    pub async fn latest_shelf(&self, pages: u32) -> Vec<Drama> {
        self.fetch_pages(pages, |p| self.latest(p)).await
    }

    /// Multi-page personalized shelf
    pub async fn for_you_shelf(&self, pages: u32) -> Vec<Drama> {
        self.fetch_pages(pages, |p| self.for_you(p)).await
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    /// The shared cache-then-fetch-then-normalize path for list facets
    async fn fetch_dramas(&self, facet: Facet) -> Result<Vec<Drama>> {
        // Snapshot the locale up front so a concurrent switch cannot
        // mis-key this request's cache write
        let locale = self.locale().await;
        let key = facet.cache_key(locale);

        if let Some(cached) = self.cache.get::<Vec<Drama>>(&key).await {
            return Ok(cached);
        }

        let raw = self.transport.fetch(&facet, locale).await?;
        let dramas = normalize_list(&raw);
        self.cache.put(&key, &dramas).await;
        Ok(dramas)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeTransport;
    use crate::cache::DEFAULT_TTL_SECS;
    use crate::clock::ManualClock;
    use crate::storage::kv::MemoryKvStore;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn setup() -> (Catalog, Arc<FakeTransport>, ManualClock) {
        let transport = Arc::new(FakeTransport::new());
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let cache = TtlCache::new(Arc::new(MemoryKvStore::new()), Arc::new(clock.clone()));
        let catalog = Catalog::new(transport.clone(), cache);
        (catalog, transport, clock)
    }

    #[tokio::test]
    async fn test_list_facet_normalizes_and_caches() {
        let (catalog, transport, _clock) = setup();
        transport.respond(
            &Facet::Trending { page: 1 },
            Locale::Th,
            json!({ "data": { "list": [{ "bookId": "1", "bookName": "A" }] } }),
        );

        let first = catalog.trending(1).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title, "A");

        let second = catalog.trending(1).await.unwrap();
        assert_eq!(second, first);
        // Second call served from cache
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_expiry_triggers_refetch() {
        let (catalog, transport, clock) = setup();
        transport.respond(
            &Facet::Latest { page: 1 },
            Locale::Th,
            json!([{ "id": "1" }]),
        );

        catalog.latest(1).await.unwrap();
        clock.advance(Duration::seconds(DEFAULT_TTL_SECS + 1));
        catalog.latest(1).await.unwrap();
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_and_is_not_cached() {
        let (catalog, transport, _clock) = setup();
        let facet = Facet::Hot { page: 1 };
        transport.fail_once(&facet, Locale::Th);
        transport.respond(&facet, Locale::Th, json!([{ "id": "1" }]));

        let err = catalog.hot(1).await.unwrap_err();
        assert!(err.is_transient());

        // No negative caching: the retry reaches the transport and succeeds
        let dramas = catalog.hot(1).await.unwrap();
        assert_eq!(dramas.len(), 1);
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_locale_switch_invalidates_and_rekeys() {
        let (catalog, transport, _clock) = setup();
        transport.respond(
            &Facet::Trending { page: 1 },
            Locale::Th,
            json!([{ "id": "1", "name": "ไทย" }]),
        );
        transport.respond(
            &Facet::Trending { page: 1 },
            Locale::En,
            json!([{ "id": "1", "name": "English" }]),
        );

        assert_eq!(catalog.trending(1).await.unwrap()[0].title, "ไทย");
        catalog.set_locale(Locale::En).await;
        assert_eq!(catalog.trending(1).await.unwrap()[0].title, "English");
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_search_blank_query_short_circuits() {
        let (catalog, transport, _clock) = setup();
        assert!(catalog.search("   ").await.unwrap().is_empty());
        assert!(catalog.search("").await.unwrap().is_empty());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_vip_flattens_nested_columns() {
        let (catalog, transport, _clock) = setup();
        transport.respond(
            &Facet::Vip,
            Locale::Th,
            json!({ "data": { "columnVoList": [
                { "bookList": [{ "id": "1" }] },
                { "bookList": [{ "id": "2" }] }
            ] } }),
        );
        let dramas = catalog.vip().await.unwrap();
        assert_eq!(dramas.len(), 2);

        // And the flattened form is what gets cached
        catalog.vip().await.unwrap();
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_episodes_are_cached_with_dense_ordinals() {
        let (catalog, transport, _clock) = setup();
        transport.respond(
            &Facet::Episodes {
                drama_id: "41".to_string(),
            },
            Locale::Th,
            json!([{ "chapterName": "EP.1" }, { "chapterName": "EP.2" }]),
        );

        let episodes = catalog.episodes("41").await.unwrap();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[1].ordinal, 1);

        catalog.episodes("41").await.unwrap();
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_aggregator_tolerates_failed_page_and_dedupes() {
        let (catalog, transport, _clock) = setup();
        transport.respond(
            &Facet::Trending { page: 1 },
            Locale::Th,
            json!([{ "id": "1", "name": "first" }, { "id": "2" }]),
        );
        transport.fail_once(&Facet::Trending { page: 2 }, Locale::Th);
        transport.respond(
            &Facet::Trending { page: 3 },
            Locale::Th,
            json!([{ "id": "2" }, { "id": "1", "name": "duplicate" }, { "id": "3" }]),
        );

        let merged = catalog.trending_shelf(3).await;
        assert_eq!(
            merged.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
            vec!["1", "2", "3"]
        );
        // First occurrence wins for duplicated ids
        assert_eq!(merged[0].title, "first");
    }
}
