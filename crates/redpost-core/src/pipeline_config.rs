use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Pipeline execution mode.
///
/// `Preview` generates and stops for human confirmation; `Auto` publishes
/// directly when the generated package is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Auto,
    #[default]
    Preview,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Mode::Auto),
            "preview" => Ok(Mode::Preview),
            other => Err(format!("unknown mode '{other}' (expected auto|preview)")),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Auto => write!(f, "auto"),
            Mode::Preview => write!(f, "preview"),
        }
    }
}

/// Cron expressions consumed by an external scheduler. The pipeline itself
/// never schedules anything; these are carried in the config record so one
/// file holds the whole operational setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleHints {
    pub trending_scan: String,
    pub auto_publish: String,
}

impl Default for ScheduleHints {
    fn default() -> Self {
        Self {
            trending_scan: "0 9,15,21 * * *".to_owned(),
            auto_publish: "0 10,14,20 * * *".to_owned(),
        }
    }
}

/// On-disk pipeline configuration (`config.json` under the data directory).
///
/// Missing fields fall back to defaults so hand-edited or older files keep
/// loading. The record is immutable during a run; only explicit config-set
/// operations rewrite it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_image_count")]
    pub image_count: usize,
    #[serde(default = "default_true")]
    pub skip_published_topics: bool,
    #[serde(default = "default_max_daily_posts")]
    pub max_daily_posts: usize,
    #[serde(default)]
    pub cron: ScheduleHints,
}

fn default_category() -> String {
    "综合".to_owned()
}

fn default_style() -> String {
    "干货分享".to_owned()
}

fn default_image_count() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_max_daily_posts() -> usize {
    3
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Preview,
            category: default_category(),
            style: default_style(),
            image_count: default_image_count(),
            skip_published_topics: true,
            max_daily_posts: default_max_daily_posts(),
            cron: ScheduleHints::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads the config file, returning defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on read failure other than absence and
    /// [`ConfigError::Parse`] when the file holds invalid JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Writes the config as pretty-printed JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on any filesystem failure.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |e: std::io::Error| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        std::fs::write(path, raw).map_err(io_err)
    }

    /// Image count clamped to the platform's 1..=9 images-per-note bound.
    #[must_use]
    pub fn clamped_image_count(&self) -> usize {
        self.image_count.clamp(1, 9)
    }
}
