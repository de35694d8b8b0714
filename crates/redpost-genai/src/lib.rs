//! AI content generation: copywriting via a chat-completions gateway, images
//! via an OpenAI-compatible image endpoint.
//!
//! The two hard surfaces live here. [`recovery`] turns an LLM's free-form
//! textual answer into a well-formed JSON object through an ordered fallback
//! chain. [`image`] normalizes image payloads that providers return in three
//! incompatible response shapes, with bounded fixed-delay retries per prompt.
//! [`Generator`] ties both into one [`ContentPackage`] per run.

pub mod content;
pub mod error;
pub mod generator;
pub mod image;
pub mod package;
pub mod prompt;
pub mod recovery;

pub use content::{ContentClient, DraftContent};
pub use error::GenError;
pub use generator::Generator;
pub use package::ContentPackage;
pub use recovery::recover_object;
pub use self::image::ImageClient;
