//! Bridge to the external browser-automation commands.
//!
//! Each collaborator is a configured shell command line. The bridge spawns
//! it, captures stdout, and takes the LAST line that parses as a JSON
//! object as the collaborator's response — everything the command prints
//! before that (progress chatter, warnings) is ignored. Extra arguments are
//! appended positionally via `sh -c '<cmd> "$@"'` so the configured command
//! line keeps its own quoting.

use std::path::Path;

use redpost_core::BridgeConfig;
use redpost_pipeline::{
    NotePublisher, PipelineError, PublishReceipt, PublishRequest, SessionGate, TrendingSource,
};
use redpost_trending::{load_snapshot, TrendingQuery, TrendingSnapshot};
use serde_json::Value;

pub struct ScriptBridge {
    config: BridgeConfig,
}

impl ScriptBridge {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn command<'a>(
        cmd: Option<&'a str>,
        var: &str,
    ) -> Result<&'a str, PipelineError> {
        cmd.ok_or_else(|| PipelineError::ExternalCallFailed(format!("{var} is not configured")))
    }
}

/// Runs a collaborator command and returns its final JSON object.
async fn run_command(cmd: &str, args: &[String]) -> Result<Value, PipelineError> {
    tracing::debug!(cmd, ?args, "running bridge command");
    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(format!("{cmd} \"$@\""))
        .arg("sh")
        .args(args)
        .output()
        .await
        .map_err(|e| PipelineError::ExternalCallFailed(format!("could not spawn '{cmd}': {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if let Some(value) = last_json_object(&stdout) {
        return Ok(value);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let skip = stderr.chars().count().saturating_sub(500);
    let tail: String = stderr.chars().skip(skip).collect();
    Err(PipelineError::ExternalCallFailed(format!(
        "'{cmd}' produced no JSON result (exit: {:?}): {tail}",
        output.status.code()
    )))
}

/// Scans stdout from the end for the first line that parses as a JSON object.
fn last_json_object(stdout: &str) -> Option<Value> {
    for line in stdout.lines().rev() {
        let line = line.trim();
        if !line.starts_with('{') {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(line) {
            if value.is_object() {
                return Some(value);
            }
        }
    }
    None
}

fn field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

impl SessionGate for ScriptBridge {
    async fn is_logged_in(&self) -> Result<bool, PipelineError> {
        let cmd = Self::command(self.config.status_cmd.as_deref(), "REDPOST_STATUS_CMD")?;
        let value = run_command(cmd, &[]).await?;
        Ok(value
            .get("logged_in")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }
}

impl TrendingSource for ScriptBridge {
    async fn scrape(&self, query: &TrendingQuery) -> Result<TrendingSnapshot, PipelineError> {
        let cmd = Self::command(self.config.trending_cmd.as_deref(), "REDPOST_TRENDING_CMD")?;

        let mut args = Vec::new();
        if let Some(keyword) = &query.keyword {
            args.push("--keyword".to_owned());
            args.push(keyword.clone());
        } else if let Some(category) = &query.category {
            args.push("--category".to_owned());
            args.push(category.clone());
        }
        args.push("--limit".to_owned());
        args.push(query.limit.to_string());

        let value = run_command(cmd, &args).await?;
        if field(&value, "status") != Some("success") {
            return Err(PipelineError::ExternalCallFailed(
                field(&value, "message").unwrap_or("trending scrape failed").to_owned(),
            ));
        }
        let output_file = field(&value, "output_file").ok_or_else(|| {
            PipelineError::ExternalCallFailed("scrape result had no output_file".to_owned())
        })?;
        load_snapshot(Path::new(output_file))
            .map_err(|e| PipelineError::ExternalCallFailed(e.to_string()))
    }
}

impl NotePublisher for ScriptBridge {
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PipelineError> {
        let cmd = Self::command(self.config.publish_cmd.as_deref(), "REDPOST_PUBLISH_CMD")?;

        let images: Vec<String> = request
            .images
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let mut args = vec![
            "--title".to_owned(),
            request.title.clone(),
            "--content".to_owned(),
            request.content.clone(),
            "--images".to_owned(),
            images.join(","),
        ];
        if !request.topics.is_empty() {
            args.push("--topics".to_owned());
            args.push(request.topics.join(","));
        }

        let value = run_command(cmd, &args).await?;
        Ok(PublishReceipt {
            success: field(&value, "status") == Some("success"),
            url: field(&value, "url").map(str::to_owned),
            message: field(&value, "message").unwrap_or_default().to_owned(),
        })
    }
}
