//! Run status stream and terminal outcomes.

use redpost_genai::ContentPackage;
use serde::Serialize;

/// Pipeline stages, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    CheckingAuth,
    ScrapingTrending,
    SelectingTopic,
    Generating,
    Previewing,
    Publishing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Started,
    Completed,
    Warning,
    Fallback,
}

/// One step record in the status stream.
#[derive(Debug, Clone, Serialize)]
pub struct StageEvent {
    pub stage: Stage,
    pub status: EventStatus,
    pub message: String,
}

/// Receives stage events as the run progresses. The same sequence is also
/// collected into [`RunReport::events`].
pub trait ProgressSink {
    fn event(&mut self, event: &StageEvent);
}

/// Default sink: forwards each event to `tracing`.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&mut self, event: &StageEvent) {
        match event.status {
            EventStatus::Warning | EventStatus::Fallback => {
                tracing::warn!(stage = ?event.stage, "{}", event.message);
            }
            EventStatus::Started | EventStatus::Completed => {
                tracing::info!(stage = ?event.stage, "{}", event.message);
            }
        }
    }
}

impl ProgressSink for Vec<StageEvent> {
    fn event(&mut self, event: &StageEvent) {
        self.push(event.clone());
    }
}

/// Terminal result of one pipeline run.
///
/// Failure outcomes that happen after generation carry the full package so
/// no generated work is lost.
#[derive(Debug)]
pub enum Outcome {
    /// Today's ceiling was already met before any external call.
    QuotaReached {
        today_posts: usize,
        max_daily_posts: usize,
    },
    /// No valid account session.
    AuthRequired { message: String },
    /// Preview mode: package emitted for human confirmation, no side effects.
    Preview { package: ContentPackage },
    /// Auto mode, published and logged.
    Published {
        package: ContentPackage,
        url: Option<String>,
        today_posts: usize,
    },
    /// Auto mode with a zero-image package: publish refused, package kept.
    PublishSkipped {
        package: ContentPackage,
        message: String,
    },
    /// The publish collaborator rejected the note; package kept.
    PublishFailed {
        package: ContentPackage,
        message: String,
    },
    /// Content generation failed; nothing downstream could proceed.
    GenerationFailed { message: String },
    /// Unexpected local failure (e.g. the publish log is unreadable).
    Error { stage: Stage, message: String },
}

impl Outcome {
    /// Whether the process should exit non-zero. `QuotaReached` is
    /// informational, not a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::AuthRequired { .. }
                | Outcome::PublishSkipped { .. }
                | Outcome::PublishFailed { .. }
                | Outcome::GenerationFailed { .. }
                | Outcome::Error { .. }
        )
    }
}

/// Everything a run produced: the terminal outcome plus the event stream.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: Outcome,
    pub events: Vec<StageEvent>,
}
