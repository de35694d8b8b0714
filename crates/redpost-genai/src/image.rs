//! Image payload normalization.
//!
//! Providers return generated images in (at least) three incompatible
//! response shapes: an `images` array on the message with data-URL entries,
//! a parts-list message body with inline/typed image parts, or a plain-text
//! body that merely links to the image. [`ImageClient`] tries the known
//! shapes in order over a tagged model of the response, fetches linked
//! images when needed, flattens any alpha channel onto white, and writes
//! one PNG per prompt index.
//!
//! Per-prompt failures are absorbed: a batch returns however many images
//! actually succeeded, possibly zero. Callers decide what an empty batch
//! means.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, Rgb, RgbImage};
use redpost_core::AppConfig;
use regex::Regex;
use serde::Deserialize;

use crate::error::GenError;
use crate::prompt::enhance_image_prompt;

static MD_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[.*?\]\((https?://[^\s)]+)\)").expect("valid regex"));
static BARE_IMAGE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https?://\S+\.(?:png|jpg|jpeg|webp|gif))").expect("valid regex")
});

#[derive(Debug, Deserialize)]
struct ImageChatResponse {
    choices: Vec<ImageChoice>,
}

#[derive(Debug, Deserialize)]
struct ImageChoice {
    message: ImageMessage,
}

/// One assistant message from an image-capable endpoint, covering the three
/// known provider shapes at once.
#[derive(Debug, Deserialize)]
pub(crate) struct ImageMessage {
    /// OpenRouter style: images attached next to the content.
    #[serde(default)]
    images: Vec<MessageImage>,
    /// Either one text blob or a typed parts list, provider-dependent.
    #[serde(default)]
    content: Option<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageImage {
    #[serde(default)]
    image_url: Option<ImageUrl>,
}

#[derive(Debug, Deserialize)]
struct ImageUrl {
    #[serde(default)]
    url: String,
}

/// Message body: a plain string or a list of typed parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One element of a parts-list body. Untagged: each known shape is matched
/// by its payload field, everything else lands in `Other`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    /// `{"type": "image", "image": {"data" | "b64_json": ...}}`
    Inline { image: InlineImage },
    /// `{"type": "image_url", "image_url": {"url": ...}}`
    Url { image_url: ImageUrl },
    /// `{"inline_data": {"data": ...}}` (Gemini style)
    InlineData { inline_data: InlineData },
    /// Unrecognized shape; skipped by extraction.
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct InlineImage {
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

impl InlineImage {
    fn payload(&self) -> Option<&str> {
        self.data
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.b64_json.as_deref().filter(|s| !s.is_empty()))
    }
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(default)]
    data: String,
}

/// What extraction found: decoded bytes, or a URL that still needs a fetch.
pub(crate) enum ImagePayload {
    Bytes(Vec<u8>),
    FetchUrl(String),
}

/// Searches one message for image data, trying the known shapes in order.
pub(crate) fn extract_image_payload(message: &ImageMessage) -> Option<ImagePayload> {
    // Shape 1: images array on the message, data-URL entries.
    for entry in &message.images {
        if let Some(url) = entry.image_url.as_ref().map(|u| u.url.as_str()) {
            if let Some(bytes) = decode_data_url(url) {
                return Some(ImagePayload::Bytes(bytes));
            }
        }
    }

    match &message.content {
        // Shape 2: typed parts list; first recognized image part wins.
        Some(MessageContent::Parts(parts)) => {
            for part in parts {
                let bytes = match part {
                    ContentPart::Inline { image } => {
                        image.payload().and_then(|b64| BASE64.decode(b64).ok())
                    }
                    ContentPart::Url { image_url } => decode_data_url(&image_url.url),
                    ContentPart::InlineData { inline_data } if !inline_data.data.is_empty() => {
                        BASE64.decode(&inline_data.data).ok()
                    }
                    ContentPart::InlineData { .. } | ContentPart::Other(_) => None,
                };
                if let Some(bytes) = bytes {
                    return Some(ImagePayload::Bytes(bytes));
                }
            }
            None
        }
        // Shape 3: plain text that links to the image.
        Some(MessageContent::Text(text)) if !text.is_empty() => {
            if let Some(captures) = MD_IMAGE_RE.captures(text) {
                return Some(ImagePayload::FetchUrl(captures[1].to_owned()));
            }
            BARE_IMAGE_URL_RE
                .captures(text)
                .map(|captures| ImagePayload::FetchUrl(captures[1].to_owned()))
        }
        _ => None,
    }
}

/// Decodes the base64 payload of a `data:` URL.
fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let rest = url.strip_prefix("data:")?;
    let (_, b64) = rest.split_once(',')?;
    BASE64.decode(b64.trim()).ok()
}

/// Normalizes a base URL to its chat-completions endpoint.
pub(crate) fn normalize_chat_url(base_url: &str) -> String {
    if base_url.ends_with("/chat/completions") {
        return base_url.to_owned();
    }
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        format!("{trimmed}/chat/completions")
    } else {
        format!("{trimmed}/v1/chat/completions")
    }
}

/// Client for an OpenAI-compatible image-generation endpoint.
pub struct ImageClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    /// Additional attempts per prompt after the first failure.
    max_retries: u32,
    /// Fixed delay between attempts for one prompt.
    retry_delay: Duration,
    /// Fixed pause between distinct prompts in a batch.
    prompt_gap: Duration,
    fetch_timeout: Duration,
}

impl ImageClient {
    /// Builds the client from the resolved image endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Config`] when any of the three endpoint vars is
    /// missing, or [`GenError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn new(config: &AppConfig) -> Result<Self, GenError> {
        let endpoint = config.image_endpoint()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.image_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: normalize_chat_url(&endpoint.base_url),
            api_key: endpoint.api_key,
            model: endpoint.model,
            max_retries: config.image_max_retries,
            retry_delay: Duration::from_secs(config.image_retry_delay_secs),
            prompt_gap: Duration::from_secs(config.image_prompt_gap_secs),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        })
    }

    /// Generates one image per prompt into `output_dir`.
    ///
    /// Prompts whose attempts are exhausted are skipped with a warning; the
    /// returned paths are the ones that actually succeeded, in prompt order.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Io`] only when the output directory cannot be
    /// created — generation failures never fail the batch.
    pub async fn generate_batch(
        &self,
        prompts: &[String],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, GenError> {
        std::fs::create_dir_all(output_dir).map_err(|e| GenError::Io {
            path: output_dir.display().to_string(),
            source: e,
        })?;

        let mut paths = Vec::new();
        for (index, prompt) in prompts.iter().enumerate() {
            tracing::info!(image = index + 1, total = prompts.len(), "generating image");
            match self.generate_one(prompt, index, output_dir).await {
                Ok(path) => paths.push(path),
                Err(err) => {
                    tracing::warn!(image = index + 1, error = %err, "prompt skipped — no image recovered");
                }
            }
            if index + 1 < prompts.len() {
                tokio::time::sleep(self.prompt_gap).await;
            }
        }
        Ok(paths)
    }

    /// Runs the bounded retry loop for one prompt.
    async fn generate_one(
        &self,
        prompt: &str,
        index: usize,
        output_dir: &Path,
    ) -> Result<PathBuf, GenError> {
        let payload = self.build_payload(prompt);
        let mut attempt_no = 0u32;
        loop {
            match self.attempt(&payload, index, output_dir).await {
                Ok(path) => return Ok(path),
                Err(err) => {
                    attempt_no += 1;
                    if attempt_no > self.max_retries {
                        return Err(GenError::ImageGenerationExhausted {
                            prompt_index: index,
                            attempts: attempt_no,
                        });
                    }
                    tracing::warn!(
                        image = index + 1,
                        attempt = attempt_no,
                        error = %err,
                        "image attempt failed — retrying after fixed delay"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    fn build_payload(&self, prompt: &str) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": enhance_image_prompt(prompt)}],
            "max_tokens": 4096,
        });
        // Gemini-family models only emit images when the modalities hint is set.
        if self.model.to_lowercase().contains("gemini") {
            payload["modalities"] = serde_json::json!(["image", "text"]);
        }
        payload
    }

    /// One request → extract → decode → save cycle.
    async fn attempt(
        &self,
        payload: &serde_json::Value,
        index: usize,
        output_dir: &Path,
    ) -> Result<PathBuf, GenError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(500)
                .collect();
            return Err(GenError::GatewayStatus {
                status: status.as_u16(),
                body,
            });
        }

        // Parse the raw bytes, not a pre-decoded structure — large base64
        // payloads must not be truncated by a partial read.
        let raw = response.bytes().await?;
        let parsed: ImageChatResponse =
            serde_json::from_slice(&raw).map_err(|e| GenError::Deserialize {
                context: format!("image completion for prompt {}", index + 1),
                source: e,
            })?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(GenError::MalformedResponse("choices"))?
            .message;

        let bytes = match extract_image_payload(&message).ok_or(GenError::NoImagePayload)? {
            ImagePayload::Bytes(bytes) => bytes,
            ImagePayload::FetchUrl(url) => self.fetch_image(&url).await?,
        };

        let path = output_dir.join(format!("image_{}.png", index + 1));
        save_image(&bytes, &path)?;
        Ok(path)
    }

    /// Secondary fetch for responses that only link to the image.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, GenError> {
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GenError::FetchStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Decodes image bytes and writes them as opaque PNG, compositing any alpha
/// channel onto a white background.
pub(crate) fn save_image(data: &[u8], path: &Path) -> Result<(), GenError> {
    let decoded = image::load_from_memory(data)?;
    let rgb = flatten_to_rgb(&decoded);
    rgb.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

fn flatten_to_rgb(decoded: &DynamicImage) -> RgbImage {
    if !decoded.color().has_alpha() {
        return decoded.to_rgb8();
    }
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut canvas = RgbImage::new(width, height);
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let alpha = f32::from(a) / 255.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let blend =
            |c: u8| -> u8 { (f32::from(c) * alpha + 255.0 * (1.0 - alpha)).round() as u8 };
        canvas.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    canvas
}

#[cfg(test)]
#[path = "image_test.rs"]
mod tests;
