//! Topic selection from a trending snapshot.

use std::collections::HashSet;

use crate::types::TrendingSnapshot;

/// Title-tier candidates are cut to this many code points.
const TITLE_TOPIC_LEN: usize = 20;

/// Picks the next unpublished topic from a snapshot, or `None` when nothing
/// usable remains. The caller owns any fallback to a default topic.
///
/// Priority tiers, first match wins:
/// 1. engagement-weighted keywords, highest score first;
/// 2. note titles in snapshot order, truncated to 20 code points;
/// 3. raw keyword counts, highest count first.
///
/// Keyword tiers require at least 2 code points. Every tier skips entries
/// already in `published` — the published check for a title uses the full
/// title, while the returned topic is the truncated form.
#[must_use]
pub fn select_topic(snapshot: &TrendingSnapshot, published: &HashSet<String>) -> Option<String> {
    for kw in &snapshot.analysis.top_weighted_keywords {
        if kw.word.chars().count() >= 2 && !published.contains(&kw.word) {
            return Some(kw.word.clone());
        }
    }

    for note in &snapshot.notes {
        if !note.title.is_empty() && !published.contains(&note.title) {
            return Some(note.title.chars().take(TITLE_TOPIC_LEN).collect());
        }
    }

    for kw in &snapshot.analysis.top_keywords {
        if kw.word.chars().count() >= 2 && !published.contains(&kw.word) {
            return Some(kw.word.clone());
        }
    }

    None
}
