//! Snapshot types for trending-note captures.
//!
//! ## Observed shape from the explore-page scraper
//!
//! Notes arrive with a `title` (the only identity a note has — titles double
//! as the dedup key downstream), a `likes` count already parsed from display
//! strings like `1.2万`, and optional author / URL / cover fields that are
//! absent whenever card extraction could not find them. A note whose title
//! extraction failed is useless and is discarded at snapshot construction.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::analyze::analyze_notes;

/// What the scraper was asked for: an explore category or a search keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub limit: usize,
}

impl TrendingQuery {
    pub fn category(category: impl Into<String>, limit: usize) -> Self {
        Self {
            category: Some(category.into()),
            keyword: None,
            limit,
        }
    }

    pub fn keyword(keyword: impl Into<String>, limit: usize) -> Self {
        Self {
            category: None,
            keyword: Some(keyword.into()),
            limit,
        }
    }

    /// Short tag used in snapshot file names.
    #[must_use]
    pub fn tag(&self) -> &str {
        self.keyword
            .as_deref()
            .or(self.category.as_deref())
            .unwrap_or("综合")
    }
}

/// One trending note card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    /// Engagement count; 0 when the card showed none.
    #[serde(default)]
    pub likes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

impl Note {
    pub fn new(title: impl Into<String>, likes: u64) -> Self {
        Self {
            title: title.into(),
            likes,
            author: None,
            url: None,
            cover: None,
        }
    }
}

/// Keyword with its raw occurrence count across note titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: u64,
}

/// Keyword with its engagement-weighted score (sum of `likes` over every
/// note whose title contains the keyword).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordScore {
    pub word: String,
    pub score: u64,
}

/// Derived keyword tables for one snapshot. Always recomputed fresh from the
/// notes; never mutated in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordAnalysis {
    pub total_notes: usize,
    pub avg_likes: f64,
    #[serde(default)]
    pub top_keywords: Vec<KeywordCount>,
    #[serde(default)]
    pub top_weighted_keywords: Vec<KeywordScore>,
}

/// One point-in-time capture of trending notes plus derived analysis.
/// Immutable once written to storage; identified by capture timestamp and
/// query tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingSnapshot {
    pub scraped_at: DateTime<Local>,
    pub query: TrendingQuery,
    pub notes: Vec<Note>,
    #[serde(default)]
    pub analysis: KeywordAnalysis,
}

impl TrendingSnapshot {
    /// Builds a snapshot from raw scraped notes: discards notes whose title
    /// extraction failed, orders by engagement descending, and computes the
    /// keyword analysis.
    #[must_use]
    pub fn new(query: TrendingQuery, scraped_at: DateTime<Local>, notes: Vec<Note>) -> Self {
        let mut notes: Vec<Note> = notes.into_iter().filter(|n| !n.title.is_empty()).collect();
        notes.sort_by(|a, b| b.likes.cmp(&a.likes));
        let analysis = analyze_notes(&notes);
        Self {
            scraped_at,
            query,
            notes,
            analysis,
        }
    }
}
