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


//! Stream variant selection
//!
//! An episode descriptor can carry several CDN groups, each with several
//! quality tiers, plus (on some providers) a direct single-URL field. This
//! module picks the one URL the player should load:
//!
//! 1. a direct URL on the episode pre-empts CDN resolution entirely;
//! 2. otherwise the CDN group flagged default, else the first group;
//! 3. within the group: the caller's preferred quality if present exactly,
//!    else the 1080/720/480 ladder, else the variant flagged default for
//!    that CDN, else the highest quality available.
//!
//! `None` means "unplayable", a sentinel the player UI renders as
//! unavailable; it is deliberately not an error, so a dead episode does not
//! look like a failed fetch.

use crate::model::{CdnGroup, Episode, QualityTier};

/// Preferred qualities tried in order when the caller states no preference
pub const QUALITY_LADDER: [u32; 3] = [1080, 720, 480];

/// Pick the best playable URL from an episode descriptor
pub fn select_best_url(episode: &Episode, preferred: Option<QualityTier>) -> Option<&str> {
    if let Some(url) = episode.direct_url.as_deref() {
        return Some(url);
    }

    let group = default_group(&episode.cdn_groups)?;
    if group.variants.is_empty() {
        return None;
    }

    // Exact preference match only; a missing preferred tier falls through
    // to the ladder rather than approximating
    if let Some(preferred) = preferred {
        if let Some(variant) = group.variants.iter().find(|v| v.quality == preferred) {
            return Some(&variant.url);
        }
    }

    for quality in QUALITY_LADDER {
        if let Some(variant) = group
            .variants
            .iter()
            .find(|v| v.quality == QualityTier::Pixels(quality))
        {
            return Some(&variant.url);
        }
    }

    if let Some(variant) = group.variants.iter().find(|v| v.is_default) {
        return Some(&variant.url);
    }

    group
        .variants
        .iter()
        .max_by(|a, b| a.quality.cmp(&b.quality))
        .map(|v| v.url.as_str())
}

fn default_group(groups: &[CdnGroup]) -> Option<&CdnGroup> {
    groups.iter().find(|g| g.is_default).or_else(|| groups.first())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StreamVariant;
    use serde_json::Value;

    fn variant(quality: QualityTier, is_default: bool, url: &str) -> StreamVariant {
        StreamVariant {
            cdn_id: "cdn-a".to_string(),
            quality,
            is_default,
            url: url.to_string(),
        }
    }

    fn episode_with(groups: Vec<CdnGroup>, direct_url: Option<&str>) -> Episode {
        Episode {
            drama_id: "1".to_string(),
            ordinal: 0,
            display_name: "Episode 1".to_string(),
            thumbnail: String::new(),
            duration_seconds: None,
            direct_url: direct_url.map(str::to_string),
            cdn_groups: groups,
            raw: Value::Null,
        }
    }

    fn ladder_group() -> CdnGroup {
        CdnGroup {
            cdn_id: "cdn-a".to_string(),
            is_default: false,
            variants: vec![
                variant(QualityTier::Pixels(480), false, "u480"),
                variant(QualityTier::Pixels(720), false, "u720"),
                variant(QualityTier::Pixels(1080), false, "u1080"),
            ],
        }
    }

    #[test]
    fn test_no_preference_walks_ladder_from_the_top() {
        let episode = episode_with(vec![ladder_group()], None);
        assert_eq!(select_best_url(&episode, None), Some("u1080"));
    }

    #[test]
    fn test_exact_preference_wins() {
        let episode = episode_with(vec![ladder_group()], None);
        assert_eq!(
            select_best_url(&episode, Some(QualityTier::Pixels(480))),
            Some("u480")
        );
    }

    #[test]
    fn test_absent_preference_falls_back_to_ladder() {
        let episode = episode_with(vec![ladder_group()], None);
        assert_eq!(
            select_best_url(&episode, Some(QualityTier::Pixels(360))),
            Some("u1080")
        );
    }

    #[test]
    fn test_empty_variants_is_unplayable() {
        let episode = episode_with(
            vec![CdnGroup {
                cdn_id: "cdn-a".to_string(),
                is_default: true,
                variants: vec![],
            }],
            None,
        );
        assert_eq!(select_best_url(&episode, None), None);

        let no_groups = episode_with(vec![], None);
        assert_eq!(select_best_url(&no_groups, None), None);
    }

    #[test]
    fn test_direct_url_preempts_cdn_resolution() {
        let episode = episode_with(vec![ladder_group()], Some("direct.mp4"));
        assert_eq!(select_best_url(&episode, None), Some("direct.mp4"));
    }

    #[test]
    fn test_default_group_preferred_over_first() {
        let other = CdnGroup {
            cdn_id: "cdn-b".to_string(),
            is_default: true,
            variants: vec![variant(QualityTier::Pixels(720), false, "b720")],
        };
        let episode = episode_with(vec![ladder_group(), other], None);
        assert_eq!(select_best_url(&episode, None), Some("b720"));
    }

    #[test]
    fn test_off_ladder_tiers_use_cdn_default_then_highest() {
        let group = CdnGroup {
            cdn_id: "cdn-a".to_string(),
            is_default: false,
            variants: vec![
                variant(QualityTier::Pixels(360), false, "u360"),
                variant(QualityTier::Pixels(540), true, "u540"),
            ],
        };
        let episode = episode_with(vec![group], None);
        assert_eq!(select_best_url(&episode, None), Some("u540"));

        let group = CdnGroup {
            cdn_id: "cdn-a".to_string(),
            is_default: false,
            variants: vec![
                variant(QualityTier::Default, false, "udefault"),
                variant(QualityTier::Pixels(360), false, "u360"),
                variant(QualityTier::Pixels(540), false, "u540"),
            ],
        };
        let episode = episode_with(vec![group], None);
        assert_eq!(select_best_url(&episode, None), Some("u540"));
    }
}
