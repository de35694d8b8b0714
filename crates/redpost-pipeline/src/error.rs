use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Generic wrapper for any collaborator call (network, browser bridge).
    #[error("external call failed: {0}")]
    ExternalCallFailed(String),

    #[error("publish log I/O error at {path}: {source}")]
    LogIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("publish log serialization error: {0}")]
    LogEncode(#[source] serde_json::Error),
}
