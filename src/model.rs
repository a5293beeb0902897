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


//! Canonical catalog model
//!
//! Everything the presentation layer sees goes through these value objects.
//! They are produced once by the normalizer ([`crate::api::normalize`]) and
//! are immutable from then on; raw upstream payloads are retained verbatim on
//! a typed side channel (`raw`) for components that need unmodeled fields,
//! such as fallback matching and debugging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Watch position at or beyond this fraction of the duration counts as
/// completed and leaves the continue-watching rail
pub const COMPLETION_RATIO: f64 = 0.95;

// ============================================================================
// CATALOG ENTITIES
// ============================================================================

/// A catalog tag, keeping the upstream display form next to a canonical form
///
/// Upstream providers ship tags either as bare strings or as objects with a
/// localized and an English name; both collapse into this pair. Order within
/// a drama is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Localized display name as the provider sent it
    pub local_name: String,
    /// Canonical (usually English) name; equals `local_name` when the
    /// provider only sent one form
    pub canonical_name: String,
}

impl Tag {
    pub fn new(local_name: impl Into<String>, canonical_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            canonical_name: canonical_name.into(),
        }
    }
}

/// A catalog title/series entity
///
/// `id` is non-empty and stable whenever upstream provides one; all other
/// fields default (empty string, 0, false) when upstream omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drama {
    /// Stable catalog identifier (string-typed even when upstream sends a number)
    pub id: String,
    pub title: String,
    pub cover_url: String,
    pub synopsis: String,
    pub episode_count: u32,
    /// Popularity metric (play/view count)
    pub play_count: u64,
    pub tags: Vec<Tag>,
    pub genre: String,
    pub release_year: u32,
    pub rating: f64,
    pub is_new: bool,
    pub is_hot: bool,
    pub is_vip: bool,
    /// Verbatim upstream payload for unmodeled fields
    #[serde(default)]
    pub raw: Value,
}

/// One playable unit of a drama
///
/// `ordinal` is 0-based, dense, and equal to the episode's position in the
/// upstream list; there is no other reliable ordering key across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub drama_id: String,
    pub ordinal: usize,
    pub display_name: String,
    pub thumbnail: String,
    pub duration_seconds: Option<u32>,
    /// Direct single-URL field on the episode; when present it pre-empts
    /// CDN-based resolution entirely
    pub direct_url: Option<String>,
    /// CDN groups in upstream order
    pub cdn_groups: Vec<CdnGroup>,
    /// Verbatim upstream payload
    #[serde(default)]
    pub raw: Value,
}

impl Episode {
    /// An episode with neither a direct URL nor any stream variant is
    /// unplayable (a sentinel state, not an error)
    pub fn is_unplayable(&self) -> bool {
        self.direct_url.is_none() && self.cdn_groups.iter().all(|g| g.variants.is_empty())
    }
}

/// A set of stream variants sharing a delivery origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdnGroup {
    pub cdn_id: String,
    /// Provider flagged this group as the preferred origin
    pub is_default: bool,
    /// At most one variant per quality tier
    pub variants: Vec<StreamVariant>,
}

/// A concrete playable rendition at one quality tier on one CDN
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamVariant {
    pub cdn_id: String,
    pub quality: QualityTier,
    /// Provider flagged this variant as the CDN's default rendition
    pub is_default: bool,
    pub url: String,
}

/// Quality tier of a stream variant: a numeric pixel height, or the
/// provider's unlabeled "default" rendition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QualityTier {
    Default,
    Pixels(u32),
}

impl QualityTier {
    /// Numeric height if this tier has one
    pub fn pixels(&self) -> Option<u32> {
        match self {
            QualityTier::Pixels(p) => Some(*p),
            QualityTier::Default => None,
        }
    }
}

impl Ord for QualityTier {
    /// Unlabeled "default" sorts below any numeric tier, so a descending
    /// sort puts the highest known quality first
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (QualityTier::Pixels(a), QualityTier::Pixels(b)) => a.cmp(b),
            (QualityTier::Pixels(_), QualityTier::Default) => Ordering::Greater,
            (QualityTier::Default, QualityTier::Pixels(_)) => Ordering::Less,
            (QualityTier::Default, QualityTier::Default) => Ordering::Equal,
        }
    }
}

impl PartialOrd for QualityTier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityTier::Default => write!(f, "default"),
            QualityTier::Pixels(p) => write!(f, "{}p", p),
        }
    }
}

// ============================================================================
// WATCH PROGRESS
// ============================================================================

/// Per-drama watch progress, one record per drama id
///
/// Carries a display snapshot (title, cover, episode name) taken at save
/// time so the history rail renders without refetching catalog data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub drama_id: String,
    pub episode_ordinal: usize,
    pub episode_name: String,
    /// Position within the episode, clamped into `[0, duration_seconds]`
    /// whenever the duration is known
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub total_episodes: u32,
    /// Display snapshot
    pub title: String,
    /// Display snapshot
    pub cover_url: String,
    pub last_watched_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Fraction watched, 0.0 when the duration is unknown
    pub fn completion_ratio(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            self.position_seconds / self.duration_seconds
        } else {
            0.0
        }
    }

    /// Terminal for continue-watching purposes; the record remains
    /// queryable as history
    pub fn is_completed(&self) -> bool {
        self.completion_ratio() >= COMPLETION_RATIO
    }

    /// Integer percentage watched for display, capped at 100
    pub fn progress_percent(&self) -> u32 {
        (self.completion_ratio() * 100.0).round().min(100.0) as u32
    }
}

/// A drama the user bookmarked, with the same display snapshot idea as
/// [`ProgressRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    pub drama_id: String,
    pub title: String,
    pub cover_url: String,
    pub total_episodes: u32,
    pub added_at: DateTime<Utc>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_tier_ordering() {
        let mut tiers = vec![
            QualityTier::Default,
            QualityTier::Pixels(720),
            QualityTier::Pixels(1080),
            QualityTier::Pixels(480),
        ];
        tiers.sort_by(|a, b| b.cmp(a));
        assert_eq!(
            tiers,
            vec![
                QualityTier::Pixels(1080),
                QualityTier::Pixels(720),
                QualityTier::Pixels(480),
                QualityTier::Default,
            ]
        );
    }

    #[test]
    fn test_completion_ratio() {
        let mut record = ProgressRecord {
            drama_id: "X".to_string(),
            episode_ordinal: 2,
            episode_name: "Episode 3".to_string(),
            position_seconds: 30.0,
            duration_seconds: 1200.0,
            total_episodes: 80,
            title: "Test".to_string(),
            cover_url: String::new(),
            last_watched_at: Utc::now(),
        };
        assert!(record.completion_ratio() < 0.03);
        assert!(!record.is_completed());

        record.position_seconds = 1180.0;
        assert!(record.is_completed());
        assert_eq!(record.progress_percent(), 98);

        // Unknown duration never counts as completed
        record.duration_seconds = 0.0;
        assert_eq!(record.completion_ratio(), 0.0);
        assert!(!record.is_completed());
    }

    #[test]
    fn test_unplayable_episode() {
        let episode = Episode {
            drama_id: "1".to_string(),
            ordinal: 0,
            display_name: "Episode 1".to_string(),
            thumbnail: String::new(),
            duration_seconds: None,
            direct_url: None,
            cdn_groups: vec![CdnGroup {
                cdn_id: "cdn-a".to_string(),
                is_default: true,
                variants: vec![],
            }],
            raw: Value::Null,
        };
        assert!(episode.is_unplayable());
    }
}
