use std::path::PathBuf;

use crate::app_config::{AppConfig, BridgeConfig, GatewayConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a numeric env var holds a non-numeric value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a numeric env var holds a non-numeric value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing logic, decoupled from the actual environment so
/// it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let data_dir = match lookup("REDPOST_DATA_DIR") {
        Ok(v) => PathBuf::from(v),
        Err(_) => {
            let home = or_default("HOME", ".");
            PathBuf::from(home).join(".redpost").join("data")
        }
    };

    let gateway = GatewayConfig {
        url: or_default(
            "REDPOST_GATEWAY_URL",
            "http://127.0.0.1:18789/v1/chat/completions",
        ),
        token: optional("REDPOST_GATEWAY_TOKEN"),
        model: or_default("REDPOST_GATEWAY_MODEL", "anthropic/claude-sonnet-4.5"),
        timeout_secs: parse_u64("REDPOST_CONTENT_TIMEOUT_SECS", "120")?,
    };

    let bridge = BridgeConfig {
        status_cmd: optional("REDPOST_STATUS_CMD"),
        trending_cmd: optional("REDPOST_TRENDING_CMD"),
        publish_cmd: optional("REDPOST_PUBLISH_CMD"),
    };

    Ok(AppConfig {
        data_dir,
        gateway,
        image_api_key: optional("IMAGE_API_KEY"),
        image_base_url: optional("IMAGE_BASE_URL"),
        image_model: optional("IMAGE_MODEL"),
        image_timeout_secs: parse_u64("REDPOST_IMAGE_TIMEOUT_SECS", "180")?,
        fetch_timeout_secs: parse_u64("REDPOST_FETCH_TIMEOUT_SECS", "60")?,
        image_max_retries: parse_u32("REDPOST_IMAGE_MAX_RETRIES", "2")?,
        image_retry_delay_secs: parse_u64("REDPOST_IMAGE_RETRY_DELAY_SECS", "3")?,
        image_prompt_gap_secs: parse_u64("REDPOST_IMAGE_PROMPT_GAP_SECS", "2")?,
        bridge,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
