//! One-call generation: copywriting, images, persisted package.

use chrono::Local;
use redpost_core::{AppConfig, DataLayout};
use redpost_trending::TrendingSnapshot;

use crate::content::ContentClient;
use crate::error::GenError;
use crate::image::ImageClient;
use crate::package::ContentPackage;
use crate::prompt::trending_context;

/// Runs the full generation step for one topic and persists the resulting
/// [`ContentPackage`] under a timestamped output directory.
pub struct Generator {
    content: ContentClient,
    image: ImageClient,
    layout: DataLayout,
}

impl Generator {
    /// Builds both clients up front so a misconfigured image endpoint fails
    /// the run before any network call.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Config`] when the image endpoint is unresolved,
    /// [`GenError::Http`] if a client cannot be constructed.
    pub fn new(config: &AppConfig) -> Result<Self, GenError> {
        Ok(Self {
            content: ContentClient::new(&config.gateway)?,
            image: ImageClient::new(config)?,
            layout: DataLayout::new(config.data_dir.clone()),
        })
    }

    /// Generates one package: draft, then images, then the persisted record.
    ///
    /// Image failures reduce the package's image list (possibly to empty);
    /// content failures abort with no partial package.
    ///
    /// # Errors
    ///
    /// Any [`GenError`] from the content call, plus I/O failures writing the
    /// output directory or package record.
    pub async fn generate(
        &self,
        topic: &str,
        style: &str,
        image_count: usize,
        trending: Option<&TrendingSnapshot>,
    ) -> Result<ContentPackage, GenError> {
        let context = trending.map(trending_context).unwrap_or_default();
        let draft = self
            .content
            .generate(topic, style, image_count, &context)
            .await?;

        tracing::info!(
            title = %draft.title,
            prompts = draft.image_prompts.len(),
            "copywriting done"
        );

        let generated_at = Local::now();
        let output_dir = self.layout.run_output_dir(&generated_at);
        let images = self
            .image
            .generate_batch(&draft.image_prompts, &output_dir)
            .await?;

        let package = ContentPackage::assemble(draft, images, topic, style, generated_at);
        package.save(&output_dir)?;
        Ok(package)
    }
}
