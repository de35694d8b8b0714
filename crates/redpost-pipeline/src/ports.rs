//! Collaborator ports.
//!
//! The browser-automation layer and the generation stack are reached only
//! through these traits. Implementations live at the binary boundary (the
//! CLI bridge) and in `redpost-genai`; tests supply fakes.

use std::path::PathBuf;

use redpost_genai::{ContentPackage, GenError, Generator};
use redpost_trending::{TrendingQuery, TrendingSnapshot};

use crate::error::PipelineError;

/// Login/session check against the external account session.
pub trait SessionGate {
    fn is_logged_in(&self) -> impl std::future::Future<Output = Result<bool, PipelineError>> + Send;
}

/// Trending scrape: returns an ordered note list with derived analysis.
pub trait TrendingSource {
    fn scrape(
        &self,
        query: &TrendingQuery,
    ) -> impl std::future::Future<Output = Result<TrendingSnapshot, PipelineError>> + Send;
}

/// Everything the publish form needs.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub title: String,
    pub content: String,
    pub images: Vec<PathBuf>,
    pub topics: Vec<String>,
}

/// What the publish collaborator reported back.
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    pub success: bool,
    pub url: Option<String>,
    pub message: String,
}

/// Publish one package through the external browser-automation layer.
pub trait NotePublisher {
    fn publish(
        &self,
        request: &PublishRequest,
    ) -> impl std::future::Future<Output = Result<PublishReceipt, PipelineError>> + Send;
}

/// The generation step: content plus images, one package per call.
pub trait ContentGenerator {
    fn generate(
        &self,
        topic: &str,
        style: &str,
        image_count: usize,
        trending: Option<&TrendingSnapshot>,
    ) -> impl std::future::Future<Output = Result<ContentPackage, GenError>> + Send;
}

impl ContentGenerator for Generator {
    async fn generate(
        &self,
        topic: &str,
        style: &str,
        image_count: usize,
        trending: Option<&TrendingSnapshot>,
    ) -> Result<ContentPackage, GenError> {
        Generator::generate(self, topic, style, image_count, trending).await
    }
}
