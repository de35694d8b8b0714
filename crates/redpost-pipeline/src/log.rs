//! The append-only publish log.
//!
//! One JSONL file per local calendar day under the published directory.
//! The log doubles as the pipeline's database: quota checks recount today's
//! file on every call (never cached across runs), and the dedup set is the
//! union of `title` over every entry ever written, not just today's.

use std::collections::HashSet;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// One publish attempt, as recorded in the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishLogEntry {
    pub published_at: DateTime<Local>,
    pub title: String,
    pub content_len: usize,
    pub image_count: usize,
    pub topics: Vec<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub message: String,
}

/// Single-writer, append-only store of [`PublishLogEntry`] records.
pub struct PublishLog {
    dir: PathBuf,
}

impl PublishLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Appends one entry to the file of the entry's local calendar day.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::LogIo`] on filesystem failure.
    pub fn append(&self, entry: &PublishLogEntry) -> Result<(), PipelineError> {
        let io_err = |path: &Path| {
            let path = path.display().to_string();
            move |e: std::io::Error| PipelineError::LogIo { path, source: e }
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        let path = self.day_file(&entry.published_at);
        let line = serde_json::to_string(entry).map_err(PipelineError::LogEncode)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err(&path))?;
        writeln!(file, "{line}").map_err(io_err(&path))?;
        Ok(())
    }

    /// Recounts today's entries. Always reads the file — the count is never
    /// cached across runs.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::LogIo`] on a read failure other than the
    /// file not existing yet.
    pub fn count_today(&self) -> Result<usize, PipelineError> {
        let path = self.day_file(&Local::now());
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(PipelineError::LogIo {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        Ok(raw.lines().filter(|l| !l.trim().is_empty()).count())
    }

    /// Union of every `title` across all day files ever written.
    ///
    /// Unreadable files and unparseable lines are skipped with a warning —
    /// a smaller dedup set only risks a repeat topic, never a crash.
    #[must_use]
    pub fn published_titles(&self) -> HashSet<String> {
        let mut titles = HashSet::new();
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return titles;
        };
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "jsonl") {
                continue;
            }
            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable log file");
                    continue;
                }
            };
            for line in raw.lines().filter(|l| !l.trim().is_empty()) {
                match serde_json::from_str::<serde_json::Value>(line) {
                    Ok(value) => {
                        if let Some(title) = value.get("title").and_then(|t| t.as_str()) {
                            if !title.is_empty() {
                                titles.insert(title.to_owned());
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unparseable log line");
                    }
                }
            }
        }
        titles
    }

    fn day_file(&self, at: &DateTime<Local>) -> PathBuf {
        self.dir.join(format!("{}.jsonl", at.format("%Y-%m-%d")))
    }
}
