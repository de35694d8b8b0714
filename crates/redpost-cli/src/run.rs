//! The `run` subcommand: wire the bridge and generator into one pipeline
//! pass and print the status stream plus a final result record as JSON
//! lines.

use redpost_core::{AppConfig, DataLayout, PipelineConfig};
use redpost_genai::Generator;
use redpost_pipeline::{run_pipeline, Outcome, ProgressSink, RunOptions, RunReport, StageEvent};

use crate::bridge::ScriptBridge;

/// Prints each stage event as one JSON line, like the collaborator scripts
/// themselves report progress.
struct JsonLineSink;

impl ProgressSink for JsonLineSink {
    fn event(&mut self, event: &StageEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{line}");
        }
    }
}

pub async fn run(
    app_config: &AppConfig,
    pipeline_config: &PipelineConfig,
    options: RunOptions,
) -> anyhow::Result<RunReport> {
    let layout = DataLayout::new(app_config.data_dir.clone());
    let bridge = ScriptBridge::new(&app_config.bridge);
    let generator = Generator::new(app_config)?;

    let report = run_pipeline(
        &layout,
        pipeline_config,
        &options,
        &bridge,
        &bridge,
        &generator,
        &bridge,
        &mut JsonLineSink,
    )
    .await;

    print_outcome(&report.outcome);
    Ok(report)
}

/// Final result record, shaped like the collaborator scripts' own result
/// lines so callers can parse one uniform stream.
fn outcome_record(outcome: &Outcome) -> serde_json::Value {
    match outcome {
        Outcome::QuotaReached {
            today_posts,
            max_daily_posts,
        } => serde_json::json!({
            "status": "limit_reached",
            "message": format!("今日已发布 {today_posts} 篇，达到每日上限 {max_daily_posts} 篇。"),
        }),
        Outcome::AuthRequired { message } => serde_json::json!({
            "status": "auth_required",
            "message": message,
        }),
        Outcome::Preview { package } => serde_json::json!({
            "status": "preview",
            "message": "内容已生成，等待确认。回复「发吧」发布，或修改意见。",
            "title": package.title,
            "content": package.content,
            "topics": package.topics,
            "images": package.images,
        }),
        Outcome::Published {
            package,
            url,
            today_posts,
        } => serde_json::json!({
            "status": "success",
            "message": format!("全自动发布成功！标题: {}", package.title),
            "url": url,
            "title": package.title,
            "today_posts": today_posts,
        }),
        Outcome::PublishSkipped { package, message } => serde_json::json!({
            "status": "error",
            "message": message,
            "title": package.title,
            "content": package.content,
            "topics": package.topics,
        }),
        Outcome::PublishFailed { package, message } => serde_json::json!({
            "status": "publish_failed",
            "message": message,
            "title": package.title,
            "content": package.content,
            "images": package.images,
        }),
        Outcome::GenerationFailed { message } => serde_json::json!({
            "status": "error",
            "message": message,
        }),
        Outcome::Error { stage, message } => serde_json::json!({
            "status": "error",
            "stage": stage,
            "message": message,
        }),
    }
}

fn print_outcome(outcome: &Outcome) {
    if let Ok(line) = serde_json::to_string(&outcome_record(outcome)) {
        println!("{line}");
    }
    // MEDIA lines let the calling agent attach the generated images.
    if let Outcome::Preview { package } = outcome {
        for image in &package.images {
            println!("MEDIA: {}", image.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use redpost_genai::content::DraftContent;
    use redpost_genai::ContentPackage;
    use std::path::PathBuf;

    fn package() -> ContentPackage {
        ContentPackage::assemble(
            DraftContent {
                title: "标题".to_owned(),
                content: "正文".to_owned(),
                topics: vec!["咖啡".to_owned()],
                image_prompts: vec!["p".to_owned()],
            },
            vec![PathBuf::from("/tmp/image_1.png")],
            "咖啡",
            "干货分享",
            Local::now(),
        )
    }

    #[test]
    fn quota_record_mirrors_the_reference_shape() {
        let record = outcome_record(&Outcome::QuotaReached {
            today_posts: 3,
            max_daily_posts: 3,
        });
        assert_eq!(record["status"], "limit_reached");
        assert!(record["message"].as_str().unwrap().contains("每日上限"));
    }

    #[test]
    fn preview_record_carries_the_package() {
        let record = outcome_record(&Outcome::Preview { package: package() });
        assert_eq!(record["status"], "preview");
        assert_eq!(record["title"], "标题");
        assert_eq!(record["topics"][0], "咖啡");
    }

    #[test]
    fn publish_skipped_record_keeps_generated_work() {
        let record = outcome_record(&Outcome::PublishSkipped {
            package: package(),
            message: "没有可用的图片，无法发布。".to_owned(),
        });
        assert_eq!(record["status"], "error");
        assert_eq!(record["title"], "标题");
        assert_eq!(record["content"], "正文");
    }

    #[test]
    fn published_record_reports_ceiling_aware_count() {
        let record = outcome_record(&Outcome::Published {
            package: package(),
            url: Some("https://example.com/note/1".to_owned()),
            today_posts: 2,
        });
        assert_eq!(record["status"], "success");
        assert_eq!(record["today_posts"], 2);
        assert_eq!(record["url"], "https://example.com/note/1");
    }
}
