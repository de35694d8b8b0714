//! Keyword analysis over note titles.
//!
//! Titles are tokenized into latin words and overlapping CJK bigrams (plus
//! whole short CJK runs), stopwords and single-character tokens are dropped,
//! and two ranked tables are produced: raw occurrence counts and
//! engagement-weighted scores. Ties break deterministically on the word so
//! repeated analysis of the same snapshot yields identical tables.

use std::collections::HashMap;

use crate::types::{KeywordAnalysis, KeywordCount, KeywordScore, Note};

/// Number of keywords kept in each ranked table.
const TOP_N: usize = 20;

/// Common particles and fillers excluded from keyword tables.
const STOPWORDS: &[&str] = &[
    "的", "了", "在", "是", "我", "有", "和", "就", "不", "人", "都", "一", "一个", "上", "也",
    "很", "到", "说", "要", "去", "你", "会", "着", "没有", "看", "好", "自己", "这", "他", "她",
    "吗", "什么", "那", "最", "出", "真的", "太", "让", "把", "被", "从", "还是", "还", "啊",
    "呢", "吧", "嘛", "哦", "哈", "呀", "啦", "可以", "怎么", "这个", "那个", "如何", "为什么",
    "但", "但是", "因为", "所以", "如果", "虽然", "而且", "或者", "以及",
];

/// Recomputes the keyword analysis for a note list.
///
/// Weighted scores sum each note's `likes` (floor 1, so zero-engagement notes
/// still register) once per token occurrence in its title.
#[must_use]
pub fn analyze_notes(notes: &[Note]) -> KeywordAnalysis {
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut weighted: HashMap<String, u64> = HashMap::new();

    for note in notes {
        let weight = note.likes.max(1);
        for token in tokenize(&note.title) {
            if STOPWORDS.contains(&token.as_str()) {
                continue;
            }
            *counts.entry(token.clone()).or_default() += 1;
            *weighted.entry(token).or_default() += weight;
        }
    }

    let total_notes = notes.len();
    let avg_likes = if notes.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let denom = notes.len() as f64;
        #[allow(clippy::cast_precision_loss)]
        let sum = notes.iter().map(|n| n.likes).sum::<u64>() as f64;
        sum / denom
    };

    KeywordAnalysis {
        total_notes,
        avg_likes,
        top_keywords: rank(counts)
            .into_iter()
            .map(|(word, count)| KeywordCount { word, count })
            .collect(),
        top_weighted_keywords: rank(weighted)
            .into_iter()
            .map(|(word, score)| KeywordScore { word, score })
            .collect(),
    }
}

/// Sorts by value descending, then word ascending, keeping the top entries.
fn rank(map: HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = map.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(TOP_N);
    entries
}

/// Splits a title into keyword candidates.
///
/// Latin/digit runs become one lowercased token each. CJK runs become their
/// overlapping bigrams; runs of 3–4 characters additionally contribute the
/// whole run, which captures common compound words without a dictionary
/// segmenter. Tokens shorter than 2 code points are dropped.
fn tokenize(title: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut latin = String::new();
    let mut cjk: Vec<char> = Vec::new();

    let flush_latin = |buf: &mut String, out: &mut Vec<String>| {
        if buf.chars().count() >= 2 {
            out.push(std::mem::take(buf));
        } else {
            buf.clear();
        }
    };
    let flush_cjk = |run: &mut Vec<char>, out: &mut Vec<String>| {
        if run.len() >= 2 {
            for window in run.windows(2) {
                out.push(window.iter().collect());
            }
            if (3..=4).contains(&run.len()) {
                out.push(run.iter().collect());
            }
        }
        run.clear();
    };

    for ch in title.chars() {
        if is_cjk(ch) {
            flush_latin(&mut latin, &mut tokens);
            cjk.push(ch);
        } else if ch.is_alphanumeric() {
            flush_cjk(&mut cjk, &mut tokens);
            latin.extend(ch.to_lowercase());
        } else {
            flush_latin(&mut latin, &mut tokens);
            flush_cjk(&mut cjk, &mut tokens);
        }
    }
    flush_latin(&mut latin, &mut tokens);
    flush_cjk(&mut cjk, &mut tokens);

    tokens
}

/// CJK Unified Ideographs, including extension A and the compatibility block.
fn is_cjk(c: char) -> bool {
    matches!(u32::from(c),
        0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF)
}
