//! The pipeline orchestrator and its durable state.
//!
//! One run sequences quota check → auth → scrape → topic selection →
//! generation → preview/publish, with the per-day publish log as the only
//! durable state: today's entry count enforces the quota and the union of
//! all logged titles is the topic dedup set. External collaborators come in
//! through the [`ports`] traits so the orchestrator can be exercised with
//! fakes.

pub mod error;
pub mod log;
pub mod orchestrator;
pub mod ports;
pub mod report;

pub use error::PipelineError;
pub use log::{PublishLog, PublishLogEntry};
pub use orchestrator::{run_pipeline, RunOptions};
pub use ports::{ContentGenerator, NotePublisher, PublishReceipt, PublishRequest, SessionGate, TrendingSource};
pub use report::{EventStatus, Outcome, ProgressSink, RunReport, Stage, StageEvent, TracingSink};
