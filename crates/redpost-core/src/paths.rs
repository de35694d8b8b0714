//! On-disk layout of the pipeline data directory.
//!
//! ```text
//! <data_dir>/
//!   config.json             pipeline configuration
//!   trending/               one snapshot file per scrape
//!   generated/<timestamp>/  one directory per generation run
//!   published/<date>.jsonl  append-only publish log, one file per day
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Resolves component paths under a single data-directory root. Components
/// never assemble these paths themselves.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    #[must_use]
    pub fn trending_dir(&self) -> PathBuf {
        self.root.join("trending")
    }

    #[must_use]
    pub fn generated_dir(&self) -> PathBuf {
        self.root.join("generated")
    }

    #[must_use]
    pub fn published_dir(&self) -> PathBuf {
        self.root.join("published")
    }

    /// Output directory for one generation run, named after its start time.
    #[must_use]
    pub fn run_output_dir(&self, started_at: &DateTime<Local>) -> PathBuf {
        self.generated_dir()
            .join(started_at.format("%Y%m%d_%H%M%S").to_string())
    }
}
