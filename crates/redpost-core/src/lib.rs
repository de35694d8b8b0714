//! Core configuration and data-directory layout for the redpost pipeline.
//!
//! Every other crate receives its settings through the types defined here —
//! no component reads process environment or ambient paths on its own.
//! [`AppConfig`] is built once at startup from environment variables;
//! [`PipelineConfig`] is the small on-disk record controlling pipeline
//! behavior (mode, category, quota) and can be rewritten by explicit
//! config-set operations.

pub mod app_config;
pub mod config;
pub mod paths;
pub mod pipeline_config;

pub use app_config::{AppConfig, BridgeConfig, GatewayConfig, ImageEndpoint};
pub use config::{load_app_config, load_app_config_from_env};
pub use paths::DataLayout;
pub use pipeline_config::{Mode, PipelineConfig, ScheduleHints};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable(s): {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("config file I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config file parse error at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
