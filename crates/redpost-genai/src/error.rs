use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    /// Every recovery fallback failed. Carries the text length only — never
    /// the text — so error payloads stay bounded.
    #[error("could not recover a JSON object from model output ({text_len} chars)")]
    RecoveryFailed { text_len: usize },

    #[error("gateway returned HTTP {status}: {body}")]
    GatewayStatus { status: u16, body: String },

    /// All attempts for one prompt ran out with no image recovered.
    /// Absorbed by the batch — callers of the batch API never see it.
    #[error("image generation exhausted after {attempts} attempts for prompt {prompt_index}")]
    ImageGenerationExhausted {
        prompt_index: usize,
        attempts: u32,
    },

    #[error("response contained no image payload")]
    NoImagePayload,

    #[error("secondary image fetch returned HTTP {status} for {url}")]
    FetchStatus { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed gateway response: missing {0}")]
    MalformedResponse(&'static str),

    #[error("image decode/encode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] redpost_core::ConfigError),
}
