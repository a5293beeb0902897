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


//! Response normalizer
//!
//! Upstream catalog providers are loosely specified and mutually
//! inconsistent: the same logical record arrives as `{id, name}` from one
//! deployment, `{bookId, bookName}` from another, wrapped in `{data: {list:
//! [...]}}` or as a bare array. Ids arrive as numbers or strings, booleans as
//! `true` or `1`.
//!
//! Each canonical attribute therefore resolves through a fixed,
//! priority-ordered list of source keys (a `const` table, not runtime type
//! inspection). The key order is a preserved contract: providers that send
//! both `bookName` and `title` mean `bookName`. Zero, false, and empty
//! values count as unset and fall through to later keys. Missing numerics
//! default to 0, missing booleans to false, and the raw payload rides along
//! verbatim on the canonical record for components that need unmodeled
//! fields.
//!
//! Nothing here performs I/O and nothing here throws: unusable input yields
//! `None` or an empty list.

use crate::model::{CdnGroup, Drama, Episode, QualityTier, StreamVariant, Tag};
use serde_json::Value;

// ============================================================================
// FIELD RESOLUTION TABLES
// ============================================================================
// Order within each table is a contract with upstream; do not reorder.

const ID_KEYS: &[&str] = &["bookId", "id"];
const TITLE_KEYS: &[&str] = &["bookName", "name", "title"];
const COVER_KEYS: &[&str] = &["coverWap", "cover", "coverUrl"];
const SYNOPSIS_KEYS: &[&str] = &["description", "synopsis", "intro"];
const EPISODE_COUNT_KEYS: &[&str] = &["chapterCount", "episodeCount"];
const PLAY_COUNT_KEYS: &[&str] = &["playCount", "views"];
const GENRE_KEYS: &[&str] = &["genre", "category"];
const YEAR_KEYS: &[&str] = &["year", "releaseYear"];
const RATING_KEYS: &[&str] = &["rating", "score"];
const IS_NEW_KEYS: &[&str] = &["isNew"];
const IS_HOT_KEYS: &[&str] = &["isHot", "hot"];
const IS_VIP_KEYS: &[&str] = &["isVip", "vip"];

const EPISODE_NAME_KEYS: &[&str] = &["chapterName", "name"];
const EPISODE_THUMB_KEYS: &[&str] = &["thumbnail", "coverUrl"];
const EPISODE_DURATION_KEYS: &[&str] = &["duration", "durationSeconds"];
/// Single-URL fields checked before any CDN grouping
const DIRECT_URL_KEYS: &[&str] = &["videoUrl", "video_url", "url", "playUrl"];

const CDN_ID_KEYS: &[&str] = &["cdnDomain", "cdnName", "cdn"];
const VARIANT_URL_KEYS: &[&str] = &["videoPath", "url"];

// ============================================================================
// VALUE COERCION HELPERS
// ============================================================================

/// First non-empty string under any of `keys`; numbers are stringified so a
/// numeric upstream id still resolves
///
/// Empty strings and zero count as unset and fall through to later keys.
fn first_string(obj: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match obj.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) if n.as_f64() != Some(0.0) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// First non-zero numeric value under any of `keys`; numeric strings count
///
/// Zero counts as unset and falls through to later keys; an all-zero chain
/// resolves to `None` and callers default to 0 anyway.
fn first_u64(obj: &Value, keys: &[&str]) -> Option<u64> {
    for key in keys {
        match obj.get(*key) {
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    if v > 0 {
                        return Some(v);
                    }
                }
                if let Some(v) = n.as_f64() {
                    if v > 0.0 {
                        return Some(v as u64);
                    }
                }
            }
            Some(Value::String(s)) => {
                if let Ok(v) = s.parse::<u64>() {
                    if v > 0 {
                        return Some(v);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn first_f64(obj: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match obj.get(*key) {
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_f64() {
                    if v != 0.0 {
                        return Some(v);
                    }
                }
            }
            Some(Value::String(s)) => {
                if let Ok(v) = s.parse::<f64>() {
                    if v != 0.0 {
                        return Some(v);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Truthiness across the shapes providers use for flags: `true`, `1`, `"1"`,
/// `"true"`
///
/// A falsy value under an earlier key falls through: `{isHot: 0, hot: 1}`
/// is hot.
fn first_bool(obj: &Value, keys: &[&str]) -> bool {
    for key in keys {
        let truthy = match obj.get(*key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
            Some(Value::String(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
            _ => false,
        };
        if truthy {
            return true;
        }
    }
    false
}

/// Truthy check for a single field on a nested object (CDN default flags)
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        Some(Value::String(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

// ============================================================================
// DRAMA NORMALIZATION
// ============================================================================

/// Normalize one upstream drama record
///
/// Returns `None` for null/non-object input and for records without a
/// resolvable non-empty id. Never panics, never errors.
pub fn normalize_drama(raw: &Value) -> Option<Drama> {
    if !raw.is_object() {
        return None;
    }
    let id = first_string(raw, ID_KEYS)?;

    Some(Drama {
        id,
        title: first_string(raw, TITLE_KEYS).unwrap_or_default(),
        cover_url: first_string(raw, COVER_KEYS).unwrap_or_default(),
        synopsis: first_string(raw, SYNOPSIS_KEYS).unwrap_or_default(),
        episode_count: first_u64(raw, EPISODE_COUNT_KEYS).unwrap_or(0) as u32,
        play_count: first_u64(raw, PLAY_COUNT_KEYS).unwrap_or(0),
        tags: normalize_tags(raw.get("tags")),
        genre: first_string(raw, GENRE_KEYS).unwrap_or_default(),
        release_year: first_u64(raw, YEAR_KEYS).unwrap_or(0) as u32,
        rating: first_f64(raw, RATING_KEYS).unwrap_or(0.0),
        is_new: first_bool(raw, IS_NEW_KEYS),
        is_hot: first_bool(raw, IS_HOT_KEYS),
        is_vip: first_bool(raw, IS_VIP_KEYS),
        raw: raw.clone(),
    })
}

/// Normalize a list response, whatever its envelope
///
/// Accepts a bare array, `{data: {list: [...]}}`, or `{data: [...]}`.
/// Items that cannot be normalized are skipped, not fatal.
pub fn normalize_list(raw: &Value) -> Vec<Drama> {
    let items: Option<&Vec<Value>> = if let Some(arr) = raw.as_array() {
        Some(arr)
    } else if let Some(arr) = raw.pointer("/data/list").and_then(Value::as_array) {
        Some(arr)
    } else if let Some(arr) = raw.get("data").and_then(Value::as_array) {
        Some(arr)
    } else {
        None
    };

    items
        .map(|arr| arr.iter().filter_map(normalize_drama).collect())
        .unwrap_or_default()
}

fn normalize_tags(raw: Option<&Value>) -> Vec<Tag> {
    let Some(arr) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(|tag| match tag {
            Value::String(s) if !s.is_empty() => Some(Tag::new(s.clone(), s.clone())),
            Value::Object(_) => {
                let local = first_string(tag, &["tagName", "name"])?;
                let canonical =
                    first_string(tag, &["enTagName", "canonicalName"]).unwrap_or_else(|| local.clone());
                Some(Tag::new(local, canonical))
            }
            _ => None,
        })
        .collect()
}

// ============================================================================
// EPISODE NORMALIZATION
// ============================================================================

/// Normalize one upstream episode record
///
/// `ordinal` is the item's position in the upstream list; there is no
/// cross-provider episode number field, so list position is the contract.
/// Some providers send an episode as a bare URL string; that becomes a
/// direct-URL episode with no CDN groups.
pub fn normalize_episode(raw: &Value, drama_id: &str, ordinal: usize) -> Episode {
    if let Value::String(url) = raw {
        return Episode {
            drama_id: drama_id.to_string(),
            ordinal,
            display_name: format!("Episode {}", ordinal + 1),
            thumbnail: String::new(),
            duration_seconds: None,
            direct_url: if url.is_empty() { None } else { Some(url.clone()) },
            cdn_groups: Vec::new(),
            raw: raw.clone(),
        };
    }

    let display_name = first_string(raw, EPISODE_NAME_KEYS)
        .unwrap_or_else(|| format!("Episode {}", ordinal + 1));
    let duration = first_u64(raw, EPISODE_DURATION_KEYS).map(|d| d as u32);

    Episode {
        drama_id: drama_id.to_string(),
        ordinal,
        display_name,
        thumbnail: first_string(raw, EPISODE_THUMB_KEYS).unwrap_or_default(),
        duration_seconds: duration,
        direct_url: first_string(raw, DIRECT_URL_KEYS),
        cdn_groups: normalize_cdn_groups(raw.get("cdnList")),
        raw: raw.clone(),
    }
}

/// Normalize an episode-list response (bare array or `{data: [...]}`),
/// assigning dense 0-based ordinals in list order
pub fn normalize_episode_list(raw: &Value, drama_id: &str) -> Vec<Episode> {
    let items: Option<&Vec<Value>> = raw
        .as_array()
        .or_else(|| raw.get("data").and_then(Value::as_array));
    items
        .map(|arr| {
            arr.iter()
                .enumerate()
                .map(|(i, ep)| normalize_episode(ep, drama_id, i))
                .collect()
        })
        .unwrap_or_default()
}

fn normalize_cdn_groups(raw: Option<&Value>) -> Vec<CdnGroup> {
    let Some(arr) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };

    arr.iter()
        .enumerate()
        .filter_map(|(index, cdn)| {
            if !cdn.is_object() {
                return None;
            }
            let cdn_id =
                first_string(cdn, CDN_ID_KEYS).unwrap_or_else(|| format!("cdn-{}", index));
            let is_default = is_truthy(cdn.get("isDefault"));

            let mut variants: Vec<StreamVariant> = Vec::new();
            if let Some(paths) = cdn.get("videoPathList").and_then(Value::as_array) {
                for path in paths {
                    let Some(url) = first_string(path, VARIANT_URL_KEYS) else {
                        continue;
                    };
                    let quality = first_u64(path, &["quality"])
                        .map(|q| QualityTier::Pixels(q as u32))
                        .unwrap_or(QualityTier::Default);
                    // At most one variant per (cdn, quality); first occurrence wins
                    if variants.iter().any(|v| v.quality == quality) {
                        continue;
                    }
                    variants.push(StreamVariant {
                        cdn_id: cdn_id.clone(),
                        quality,
                        is_default: is_truthy(path.get("isDefault")),
                        url,
                    });
                }
            }

            Some(CdnGroup {
                cdn_id,
                is_default,
                variants,
            })
        })
        .collect()
}

// ============================================================================
// COMPOSITE SHAPES
// ============================================================================

/// Result of a detail request: some deployments embed the drama and its
/// episode list, some only one of the two
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailPayload {
    pub drama: Option<Drama>,
    pub episodes: Vec<Episode>,
}

/// Normalize a detail response
///
/// Tolerated shapes, after unwrapping an optional `data` envelope:
/// - `{drama: {...}, chapters: [...]}` - both halves
/// - `{chapters: [...]}` - episodes only, drama must come from a fallback
/// - a plain drama object
pub fn normalize_detail(raw: &Value, drama_id: &str) -> DetailPayload {
    let body = raw.get("data").filter(|d| d.is_object()).unwrap_or(raw);

    let episodes = body
        .get("chapters")
        .map(|chapters| normalize_episode_list(chapters, drama_id))
        .unwrap_or_default();

    let drama = match body.get("drama") {
        Some(embedded) => normalize_drama(embedded),
        // No explicit drama half: the body itself may be the drama record,
        // unless it was only a chapter envelope
        None if body.get("chapters").is_none() => normalize_drama(body),
        None => None,
    };

    DetailPayload { drama, episodes }
}

/// Flatten the VIP catalog's nested category groupings
/// (`columnVoList[].bookList[]`) into one drama list
///
/// Falls back to plain list normalization when the response is not
/// column-grouped.
pub fn flatten_vip_columns(raw: &Value) -> Vec<Drama> {
    let body = raw.get("data").filter(|d| d.is_object()).unwrap_or(raw);

    let Some(columns) = body.get("columnVoList").and_then(Value::as_array) else {
        return normalize_list(raw);
    };

    columns
        .iter()
        .filter_map(|col| col.get("bookList").and_then(Value::as_array))
        .flatten()
        .filter_map(normalize_drama)
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
