use std::path::PathBuf;

use crate::ConfigError;

/// Content-generation gateway settings (chat-completions endpoint).
#[derive(Clone)]
pub struct GatewayConfig {
    /// Full URL of the chat-completions endpoint.
    pub url: String,
    /// Bearer token; omitted from the request when `None`.
    pub token: Option<String>,
    /// Model identifier sent in the request body.
    pub model: String,
    /// Whole-call timeout in seconds.
    pub timeout_secs: u64,
}

/// Resolved image-generation endpoint. All three fields are required before
/// any image call is issued; see [`AppConfig::image_endpoint`].
#[derive(Debug, Clone)]
pub struct ImageEndpoint {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// External collaborator commands run by the CLI bridge. Each is a full shell
/// command line; stdout's last JSON line is the collaborator's response.
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    pub status_cmd: Option<String>,
    pub trending_cmd: Option<String>,
    pub publish_cmd: Option<String>,
}

#[derive(Clone)]
pub struct AppConfig {
    /// Root of all persisted pipeline state (snapshots, packages, publish log).
    pub data_dir: PathBuf,
    pub gateway: GatewayConfig,
    /// Raw image-endpoint vars; may be partially set. Use
    /// [`AppConfig::image_endpoint`] to resolve.
    pub image_api_key: Option<String>,
    pub image_base_url: Option<String>,
    pub image_model: Option<String>,
    /// Whole-call timeout for one image-generation request, in seconds.
    pub image_timeout_secs: u64,
    /// Timeout for the secondary fetch of an image URL, in seconds.
    pub fetch_timeout_secs: u64,
    /// Additional attempts per prompt after the first failure.
    pub image_max_retries: u32,
    /// Fixed delay between attempts for the same prompt, in seconds.
    pub image_retry_delay_secs: u64,
    /// Fixed pause between distinct prompts in a batch, in seconds.
    pub image_prompt_gap_secs: u64,
    pub bridge: BridgeConfig,
}

impl AppConfig {
    /// Resolves the image-generation endpoint, requiring all three vars.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] naming every missing variable
    /// so the operator can fix them in one pass.
    pub fn image_endpoint(&self) -> Result<ImageEndpoint, ConfigError> {
        let mut missing = Vec::new();
        if self.image_api_key.is_none() {
            missing.push("IMAGE_API_KEY");
        }
        if self.image_base_url.is_none() {
            missing.push("IMAGE_BASE_URL");
        }
        if self.image_model.is_none() {
            missing.push("IMAGE_MODEL");
        }
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvVar(missing.join(", ")));
        }
        Ok(ImageEndpoint {
            api_key: self.image_api_key.clone().expect("checked above"),
            base_url: self.image_base_url.clone().expect("checked above"),
            model: self.image_model.clone().expect("checked above"),
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("data_dir", &self.data_dir)
            .field("gateway_url", &self.gateway.url)
            .field(
                "gateway_token",
                &self.gateway.token.as_ref().map(|_| "[redacted]"),
            )
            .field("gateway_model", &self.gateway.model)
            .field("gateway_timeout_secs", &self.gateway.timeout_secs)
            .field(
                "image_api_key",
                &self.image_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("image_base_url", &self.image_base_url)
            .field("image_model", &self.image_model)
            .field("image_timeout_secs", &self.image_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("image_max_retries", &self.image_max_retries)
            .field("image_retry_delay_secs", &self.image_retry_delay_secs)
            .field("image_prompt_gap_secs", &self.image_prompt_gap_secs)
            .field("bridge", &self.bridge)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_image(
        key: Option<&str>,
        url: Option<&str>,
        model: Option<&str>,
    ) -> AppConfig {
        AppConfig {
            data_dir: PathBuf::from("/tmp/redpost"),
            gateway: GatewayConfig {
                url: "http://127.0.0.1:18789/v1/chat/completions".to_owned(),
                token: Some("secret".to_owned()),
                model: "anthropic/claude-sonnet-4.5".to_owned(),
                timeout_secs: 120,
            },
            image_api_key: key.map(str::to_owned),
            image_base_url: url.map(str::to_owned),
            image_model: model.map(str::to_owned),
            image_timeout_secs: 180,
            fetch_timeout_secs: 60,
            image_max_retries: 2,
            image_retry_delay_secs: 3,
            image_prompt_gap_secs: 2,
            bridge: BridgeConfig::default(),
        }
    }

    #[test]
    fn image_endpoint_resolves_when_all_set() {
        let config = config_with_image(Some("k"), Some("https://api.example.com/v1"), Some("m"));
        let endpoint = config.image_endpoint().unwrap();
        assert_eq!(endpoint.api_key, "k");
        assert_eq!(endpoint.base_url, "https://api.example.com/v1");
        assert_eq!(endpoint.model, "m");
    }

    #[test]
    fn image_endpoint_names_all_missing_vars() {
        let config = config_with_image(None, Some("https://api.example.com/v1"), None);
        let err = config.image_endpoint().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("IMAGE_API_KEY"), "got: {msg}");
        assert!(msg.contains("IMAGE_MODEL"), "got: {msg}");
        assert!(!msg.contains("IMAGE_BASE_URL"), "got: {msg}");
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = config_with_image(Some("super-secret"), Some("u"), Some("m"));
        let dump = format!("{config:?}");
        assert!(!dump.contains("super-secret"), "got: {dump}");
        assert!(!dump.contains("secret\""), "got: {dump}");
        assert!(dump.contains("[redacted]"), "got: {dump}");
    }
}
