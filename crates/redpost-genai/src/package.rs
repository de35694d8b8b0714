//! The generated content package.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::content::DraftContent;
use crate::error::GenError;

pub const PACKAGE_FILE: &str = "package.json";

/// One generated title/body/topics/image bundle, ready for preview or
/// publish. Created whole by a generation run and never partially mutated —
/// a failed generation discards the entire attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPackage {
    pub title: String,
    pub content: String,
    pub topics: Vec<String>,
    pub image_prompts: Vec<String>,
    /// Saved image files; at most one per prompt, fewer when some
    /// generations failed.
    pub images: Vec<PathBuf>,
    /// The topic the run was asked to write about.
    pub topic: String,
    pub style: String,
    pub generated_at: DateTime<Local>,
}

impl ContentPackage {
    /// Assembles a package from a validated draft and the images that
    /// actually materialized.
    ///
    /// # Panics
    ///
    /// Debug builds assert the image-count invariant; the image batch can
    /// never return more paths than prompts.
    #[must_use]
    pub fn assemble(
        draft: DraftContent,
        images: Vec<PathBuf>,
        topic: &str,
        style: &str,
        generated_at: DateTime<Local>,
    ) -> Self {
        debug_assert!(images.len() <= draft.image_prompts.len());
        Self {
            title: draft.title,
            content: draft.content,
            topics: draft.topics,
            image_prompts: draft.image_prompts,
            images,
            topic: topic.to_owned(),
            style: style.to_owned(),
            generated_at,
        }
    }

    /// Writes the package record into `output_dir` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Io`] on filesystem failure.
    pub fn save(&self, output_dir: &Path) -> Result<PathBuf, GenError> {
        let io_err = |path: &Path| {
            let path = path.display().to_string();
            move |e: std::io::Error| GenError::Io { path, source: e }
        };
        std::fs::create_dir_all(output_dir).map_err(io_err(output_dir))?;

        let path = output_dir.join(PACKAGE_FILE);
        let raw = serde_json::to_string_pretty(self).map_err(|e| GenError::Deserialize {
            context: "content package".to_owned(),
            source: e,
        })?;
        std::fs::write(&path, raw).map_err(io_err(&path))?;
        Ok(path)
    }

    /// Reads a previously saved package record.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Io`] on read failure, [`GenError::Deserialize`]
    /// when the file does not hold a package.
    pub fn load(path: &Path) -> Result<Self, GenError> {
        let raw = std::fs::read_to_string(path).map_err(|e| GenError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&raw).map_err(|e| GenError::Deserialize {
            context: "content package".to_owned(),
            source: e,
        })
    }
}
