//! Copywriting generation via the chat-completions gateway.

use std::time::Duration;

use redpost_core::GatewayConfig;
use serde::{Deserialize, Serialize};

use crate::error::GenError;
use crate::prompt::{copywriting_prompt, style_prompt};
use crate::recovery::recover_object;

pub const MAX_TITLE_CHARS: usize = 50;
pub const MAX_CONTENT_CHARS: usize = 1000;
pub const MAX_TOPICS: usize = 10;

/// The structured record recovered from the model's textual answer.
///
/// Every field defaults so a partially-shaped object still decodes; bounds
/// are enforced by [`DraftContent::truncate_to_policy`] afterwards —
/// truncation, not rejection, is the policy for over-length fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub image_prompts: Vec<String>,
}

impl DraftContent {
    /// Hard-truncates every field to policy bounds. Idempotent: applying it
    /// to a compliant draft changes nothing.
    pub fn truncate_to_policy(&mut self, image_count: usize) {
        truncate_chars(&mut self.title, MAX_TITLE_CHARS);
        truncate_chars(&mut self.content, MAX_CONTENT_CHARS);
        self.topics.truncate(MAX_TOPICS);
        self.image_prompts.truncate(image_count);
    }
}

/// Cuts a string to at most `max` code points, on a character boundary.
fn truncate_chars(s: &mut String, max: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

/// Client for the copywriting gateway (OpenAI-compatible chat completions).
pub struct ContentClient {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    model: String,
}

impl ContentClient {
    /// Builds the client with the gateway's whole-call timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &GatewayConfig) -> Result<Self, GenError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            token: config.token.clone(),
            model: config.model.clone(),
        })
    }

    /// Generates a draft for `topic` in the given style.
    ///
    /// The raw model text runs through [`recover_object`] and the result is
    /// truncated to policy bounds (`image_count` caps the prompt list).
    ///
    /// # Errors
    ///
    /// - [`GenError::GatewayStatus`] on a non-2xx response (body truncated
    ///   to 500 chars).
    /// - [`GenError::RecoveryFailed`] when no object can be recovered.
    /// - [`GenError::Http`] / [`GenError::Deserialize`] /
    ///   [`GenError::MalformedResponse`] on transport or envelope problems.
    pub async fn generate(
        &self,
        topic: &str,
        style: &str,
        image_count: usize,
        trending_context: &str,
    ) -> Result<DraftContent, GenError> {
        let prompt = copywriting_prompt(topic, style_prompt(style), trending_context, image_count);
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.8,
            "max_tokens": 2000,
        });

        tracing::info!(topic, style, "generating copywriting");

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_chars(&mut body, 500);
            return Err(GenError::GatewayStatus {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.bytes().await?;
        let envelope: ChatResponse =
            serde_json::from_slice(&raw).map_err(|e| GenError::Deserialize {
                context: "chat completion".to_owned(),
                source: e,
            })?;
        let text = envelope
            .choices
            .into_iter()
            .next()
            .ok_or(GenError::MalformedResponse("choices"))?
            .message
            .content;

        let value = recover_object(&text)?;
        let mut draft: DraftContent =
            serde_json::from_value(value).map_err(|e| GenError::Deserialize {
                context: "draft content".to_owned(),
                source: e,
            })?;
        draft.truncate_to_policy(image_count);
        Ok(draft)
    }
}

#[cfg(test)]
#[path = "content_test.rs"]
mod tests;
