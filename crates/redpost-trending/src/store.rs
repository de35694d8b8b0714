//! Snapshot persistence.
//!
//! One JSON file per scrape under the trending directory, named
//! `<YYYY-MM-DD_HHMMSS>_<tag>.json` so lexicographic file-name order is
//! capture order. The newest readable file backs the orchestrator's
//! scrape-failure fallback.

use std::path::{Path, PathBuf};

use crate::error::TrendingError;
use crate::types::TrendingSnapshot;

/// Writes a snapshot into `dir`, creating the directory if needed.
///
/// Returns the path written.
///
/// # Errors
///
/// Returns [`TrendingError::Io`] on filesystem failure.
pub fn save_snapshot(dir: &Path, snapshot: &TrendingSnapshot) -> Result<PathBuf, TrendingError> {
    let io_err = |path: &Path| {
        let path = path.display().to_string();
        move |e: std::io::Error| TrendingError::Io { path, source: e }
    };

    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let name = format!(
        "{}_{}.json",
        snapshot.scraped_at.format("%Y-%m-%d_%H%M%S"),
        sanitize_tag(snapshot.query.tag())
    );
    let path = dir.join(name);

    let raw = serde_json::to_string_pretty(snapshot).map_err(|e| TrendingError::Deserialize {
        path: path.display().to_string(),
        source: e,
    })?;
    std::fs::write(&path, raw).map_err(io_err(&path))?;
    Ok(path)
}

/// Loads the most recent snapshot from `dir`, newest file name first.
///
/// Returns `Ok(None)` when the directory is missing or holds no readable
/// snapshot. Corrupt files are skipped with a warning rather than failing
/// the lookup — a stale fallback beats no fallback.
///
/// # Errors
///
/// Returns [`TrendingError::Io`] only when the directory itself cannot be
/// listed for a reason other than absence.
pub fn latest_snapshot(dir: &Path) -> Result<Option<TrendingSnapshot>, TrendingError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(TrendingError::Io {
                path: dir.display().to_string(),
                source: e,
            })
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    for path in files.into_iter().rev() {
        match load_snapshot(&path) {
            Ok(snapshot) => return Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable snapshot");
            }
        }
    }
    Ok(None)
}

/// Loads one snapshot file.
///
/// # Errors
///
/// Returns [`TrendingError::Io`] on read failure, [`TrendingError::Deserialize`]
/// when the file does not hold a snapshot.
pub fn load_snapshot(path: &Path) -> Result<TrendingSnapshot, TrendingError> {
    let raw = std::fs::read_to_string(path).map_err(|e| TrendingError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&raw).map_err(|e| TrendingError::Deserialize {
        path: path.display().to_string(),
        source: e,
    })
}

/// Replaces path separators in a query tag so it stays one file name.
fn sanitize_tag(tag: &str) -> String {
    tag.replace(['/', '\\'], "_")
}
