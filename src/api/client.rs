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


//! Upstream catalog transport
//!
//! The catalog service talks to upstream through the [`CatalogTransport`]
//! facade: `(facet, locale) -> raw JSON`. [`HttpTransport`] is the reqwest
//! implementation; tests substitute a scripted one.
//!
//! # Endpoints
//! One deployment of the upstream exposes, relative to the base URL:
//! - `/trending`, `/latest`, `/foryou`, `/hot`, `/completed` - paged shelves
//! - `/category/{name}` - paged category listing
//! - `/search?query=` - full-text search
//! - `/home`, `/recommend`, `/vip` - secondary catalogs (fallback sources)
//! - `/detail?bookId=` - drama detail, sometimes with embedded episode list
//! - `/allepisode?bookId=` - full episode list with CDN descriptors
//!
//! Other deployments rename endpoints freely; only [`Facet::path`] knows the
//! names, so retargeting is a one-function change.
//!
//! Every request carries a `lang` parameter. The locale is also part of each
//! cache key, so a response from a superseded request (rapid locale switch)
//! can still complete and land in the cache without contaminating the new
//! locale's entries.

use crate::error::{DramaCoreError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

/// Maximum attempts per request (1 initial + 2 retries)
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Initial retry delay in seconds (exponential backoff: 1s, 2s, 4s)
const INITIAL_RETRY_DELAY_SECS: u64 = 1;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default upstream base URL
const DEFAULT_BASE_URL: &str = "https://api.megawe.net/api/dramabox";

// ============================================================================
// LOCALE
// ============================================================================

/// Content locales the upstream serves
///
/// Payloads are locale-specific, so the active locale is part of every
/// request and every cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    /// Thai (upstream default)
    Th,
    /// English
    En,
    /// Indonesian
    Id,
    /// Chinese
    Zh,
}

impl Locale {
    /// Language code for the `lang` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Th => "th",
            Self::En => "en",
            Self::Id => "id",
            Self::Zh => "zh",
        }
    }

    /// Parse a language code
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "th" => Some(Self::Th),
            "en" => Some(Self::En),
            "id" => Some(Self::Id),
            "zh" => Some(Self::Zh),
            _ => None,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::Th
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FACETS
// ============================================================================

/// One request facet of the upstream catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Facet {
    Trending { page: u32 },
    Latest { page: u32 },
    ForYou { page: u32 },
    Hot { page: u32 },
    Completed { page: u32 },
    Category { name: String, page: u32 },
    Search { query: String },
    Home { page: u32, size: u32 },
    Recommend,
    Vip,
    Detail { drama_id: String },
    Episodes { drama_id: String },
}

impl Facet {
    /// Endpoint path including query parameters, relative to the base URL
    pub fn path(&self) -> String {
        match self {
            Facet::Trending { page } => format!("/trending?page={}", page),
            Facet::Latest { page } => format!("/latest?page={}", page),
            Facet::ForYou { page } => format!("/foryou?page={}", page),
            Facet::Hot { page } => format!("/hot?page={}", page),
            Facet::Completed { page } => format!("/completed?page={}", page),
            Facet::Category { name, page } => {
                format!("/category/{}?page={}", urlencoding::encode(name), page)
            }
            Facet::Search { query } => {
                format!("/search?query={}", urlencoding::encode(query))
            }
            Facet::Home { page, size } => format!("/home?page={}&pageSize={}", page, size),
            Facet::Recommend => "/recommend".to_string(),
            Facet::Vip => "/vip".to_string(),
            Facet::Detail { drama_id } => {
                format!("/detail?bookId={}", urlencoding::encode(drama_id))
            }
            Facet::Episodes { drama_id } => {
                format!("/allepisode?bookId={}", urlencoding::encode(drama_id))
            }
        }
    }

    /// Request fingerprint used as the cache key
    ///
    /// Facet, parameters and locale all participate: two pages of the same
    /// shelf, or the same shelf in two languages, never share an entry.
    pub fn cache_key(&self, locale: Locale) -> String {
        format!("{}|{}", self.path(), locale.as_str())
    }
}

// ============================================================================
// TRANSPORT
// ============================================================================

/// Configuration for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upstream base URL, no trailing slash
    pub base_url: String,
    /// Optional CORS proxy; the full upstream URL is percent-encoded and
    /// appended to it (browser deployments only)
    pub cors_proxy: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cors_proxy: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: MAX_RETRY_ATTEMPTS,
            user_agent: format!("DramaShelf/{} (drama-core)", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn cors_proxy<S: Into<String>>(mut self, proxy: S) -> Self {
        self.config.cors_proxy = Some(proxy.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Request facade over the upstream catalog service
///
/// The wire shape of what comes back is intentionally unspecified; the
/// normalizer deals with it. Implementations only promise "raw JSON or a
/// typed failure".
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn fetch(&self, facet: &Facet, locale: Locale) -> Result<Value>;
}

/// HTTP implementation of [`CatalogTransport`]
///
/// Retries transient failures (connect errors, timeouts, 5xx) with
/// exponential backoff; 4xx responses and unparseable bodies fail
/// immediately. A transport timeout surfaces as an ordinary fetch failure.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|e| {
                DramaCoreError::InvalidInput(format!("invalid user agent: {}", e))
            })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Full request URL for a facet: base + path + `lang`, optionally
    /// wrapped in the CORS proxy
    fn request_url(&self, facet: &Facet, locale: Locale) -> String {
        let path = facet.path();
        let separator = if path.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{}{}lang={}",
            self.config.base_url,
            path,
            separator,
            locale.as_str()
        );
        match &self.config.cors_proxy {
            Some(proxy) => format!("{}{}", proxy, urlencoding::encode(&url)),
            None => url,
        }
    }
}

#[async_trait]
impl CatalogTransport for HttpTransport {
    async fn fetch(&self, facet: &Facet, locale: Locale) -> Result<Value> {
        let url = self.request_url(facet, locale);
        let endpoint = facet.path();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            log::debug!("GET {} (attempt {})", endpoint, attempt);

            match self.client.get(&url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<Value>().await.map_err(|e| {
                            DramaCoreError::invalid_response(format!(
                                "{}: body is not JSON: {}",
                                endpoint, e
                            ))
                        });
                    }

                    if status.is_server_error() && attempt < self.config.max_retries {
                        let delay = INITIAL_RETRY_DELAY_SECS << (attempt - 1);
                        log::warn!("{} answered {}, retrying in {}s", endpoint, status, delay);
                        sleep(Duration::from_secs(delay)).await;
                        continue;
                    }

                    return Err(DramaCoreError::fetch_failed(
                        format!("HTTP {}", status.as_u16()),
                        Some(status.as_u16()),
                        Some(endpoint),
                    ));
                }
                Err(e)
                    if (e.is_timeout() || e.is_connect())
                        && attempt < self.config.max_retries =>
                {
                    let delay = INITIAL_RETRY_DELAY_SECS << (attempt - 1);
                    log::warn!("{} failed ({}), retrying in {}s", endpoint, e, delay);
                    sleep(Duration::from_secs(delay)).await;
                }
                Err(e) => {
                    log::error!("{} failed: {}", endpoint, e);
                    return Err(DramaCoreError::fetch_failed(
                        e.to_string(),
                        e.status().map(|s| s.as_u16()),
                        Some(endpoint),
                    ));
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
