//! The pipeline state machine.
//!
//! Stage order: quota check → `CheckingAuth` → `ScrapingTrending` →
//! `SelectingTopic` → `Generating` → `Previewing` | `Publishing` → `Done`,
//! with `QuotaReached` and `AuthRequired` as early exits. The quota check
//! runs before any external call. Scrape failures degrade to the most
//! recent saved snapshot; generation failures are fatal; publish failures
//! keep the generated package in the outcome so nothing is lost.

use std::collections::HashSet;

use chrono::Local;
use redpost_core::{DataLayout, Mode, PipelineConfig};
use redpost_trending::{latest_snapshot, save_snapshot, select_topic, TrendingQuery};

use crate::log::{PublishLog, PublishLogEntry};
use crate::ports::{ContentGenerator, NotePublisher, PublishRequest, SessionGate, TrendingSource};
use crate::report::{EventStatus, Outcome, ProgressSink, RunReport, Stage, StageEvent};

/// The catch-all category; selecting it as a fallback topic would be
/// meaningless, so the generic topic below is used instead.
const GENERIC_CATEGORY: &str = "综合";
const GENERIC_FALLBACK_TOPIC: &str = "生活分享";
const TRENDING_LIMIT: usize = 20;

/// Per-run overrides on top of [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: Option<Mode>,
    pub category: Option<String>,
    pub keyword: Option<String>,
    /// Reuse the most recent saved snapshot instead of scraping.
    pub skip_trending: bool,
}

struct EventLog<'a> {
    events: Vec<StageEvent>,
    sink: &'a mut dyn ProgressSink,
}

impl EventLog<'_> {
    fn emit(&mut self, stage: Stage, status: EventStatus, message: String) {
        let event = StageEvent {
            stage,
            status,
            message,
        };
        self.sink.event(&event);
        self.events.push(event);
    }

    fn finish(self, outcome: Outcome) -> RunReport {
        RunReport {
            outcome,
            events: self.events,
        }
    }
}

/// Runs one full pipeline pass.
///
/// Never returns an error: every terminal condition is an [`Outcome`], and
/// [`Outcome::is_failure`] drives the caller's exit code.
#[allow(clippy::too_many_lines)]
pub async fn run_pipeline<Gate, Source, Gen, Pub>(
    layout: &DataLayout,
    config: &PipelineConfig,
    options: &RunOptions,
    gate: &Gate,
    source: &Source,
    generator: &Gen,
    publisher: &Pub,
    sink: &mut dyn ProgressSink,
) -> RunReport
where
    Gate: SessionGate,
    Source: TrendingSource,
    Gen: ContentGenerator,
    Pub: NotePublisher,
{
    let log = PublishLog::new(layout.published_dir());
    let mut events = EventLog {
        events: Vec::new(),
        sink,
    };

    // Quota first — recomputed from the log, before any network activity.
    let today_posts = match log.count_today() {
        Ok(n) => n,
        Err(e) => {
            return events.finish(Outcome::Error {
                stage: Stage::Start,
                message: e.to_string(),
            })
        }
    };
    if today_posts >= config.max_daily_posts {
        return events.finish(Outcome::QuotaReached {
            today_posts,
            max_daily_posts: config.max_daily_posts,
        });
    }

    let mode = options.mode.unwrap_or(config.mode);
    let category = options
        .category
        .clone()
        .unwrap_or_else(|| config.category.clone());

    events.emit(
        Stage::Start,
        EventStatus::Started,
        format!("开始自动流水线 (模式: {mode}, 分类: {category})"),
    );

    events.emit(
        Stage::CheckingAuth,
        EventStatus::Started,
        "检查登录状态...".to_owned(),
    );
    match gate.is_logged_in().await {
        Ok(true) => {}
        Ok(false) => {
            return events.finish(Outcome::AuthRequired {
                message: "未登录小红书，请先运行登录。".to_owned(),
            })
        }
        Err(e) => {
            return events.finish(Outcome::AuthRequired {
                message: format!("登录状态检查失败: {e}"),
            })
        }
    }

    let mut snapshot = None;
    if options.skip_trending {
        events.emit(
            Stage::ScrapingTrending,
            EventStatus::Fallback,
            "跳过热点爬取，使用最近一次数据。".to_owned(),
        );
    } else {
        let target = options.keyword.as_deref().unwrap_or(&category);
        events.emit(
            Stage::ScrapingTrending,
            EventStatus::Started,
            format!("正在爬取热点 ({target})..."),
        );
        let query = match &options.keyword {
            Some(keyword) => TrendingQuery::keyword(keyword.clone(), TRENDING_LIMIT),
            None => TrendingQuery::category(category.clone(), TRENDING_LIMIT),
        };
        match source.scrape(&query).await {
            Ok(snap) => {
                if let Err(e) = save_snapshot(&layout.trending_dir(), &snap) {
                    tracing::warn!(error = %e, "could not persist trending snapshot");
                }
                snapshot = Some(snap);
            }
            Err(e) => {
                events.emit(
                    Stage::ScrapingTrending,
                    EventStatus::Warning,
                    format!("热点爬取失败: {e}，尝试使用已有数据。"),
                );
            }
        }
    }
    if snapshot.is_none() {
        match latest_snapshot(&layout.trending_dir()) {
            Ok(found) => snapshot = found,
            Err(e) => tracing::warn!(error = %e, "could not read saved snapshots"),
        }
    }

    let published = if config.skip_published_topics {
        log.published_titles()
    } else {
        HashSet::new()
    };
    let topic = match snapshot.as_ref().and_then(|s| select_topic(s, &published)) {
        Some(topic) => {
            events.emit(
                Stage::SelectingTopic,
                EventStatus::Completed,
                format!("选择话题: {topic}"),
            );
            topic
        }
        None => {
            let fallback = if category == GENERIC_CATEGORY {
                GENERIC_FALLBACK_TOPIC.to_owned()
            } else {
                category.clone()
            };
            events.emit(
                Stage::SelectingTopic,
                EventStatus::Fallback,
                format!("没有找到未发布的热门话题，使用默认话题: {fallback}"),
            );
            fallback
        }
    };

    events.emit(
        Stage::Generating,
        EventStatus::Started,
        format!("正在生成内容 (话题: {topic}, 风格: {})...", config.style),
    );
    let package = match generator
        .generate(
            &topic,
            &config.style,
            config.clamped_image_count(),
            snapshot.as_ref(),
        )
        .await
    {
        Ok(package) => package,
        Err(e) => {
            return events.finish(Outcome::GenerationFailed {
                message: format!("内容生成失败: {e}"),
            })
        }
    };

    if mode == Mode::Preview {
        events.emit(
            Stage::Previewing,
            EventStatus::Completed,
            "内容已生成，等待确认。回复「发吧」发布，或修改意见。".to_owned(),
        );
        return events.finish(Outcome::Preview { package });
    }

    // Auto mode refuses to publish a zero-image package; the generated
    // content is still surfaced so nothing is lost.
    if package.images.is_empty() {
        return events.finish(Outcome::PublishSkipped {
            package,
            message: "没有可用的图片，无法发布。降级为预览模式。".to_owned(),
        });
    }

    events.emit(
        Stage::Publishing,
        EventStatus::Started,
        format!("正在发布笔记: {}", package.title),
    );
    let request = PublishRequest {
        title: package.title.clone(),
        content: package.content.clone(),
        images: package.images.clone(),
        topics: package.topics.clone(),
    };
    match publisher.publish(&request).await {
        Ok(receipt) if receipt.success => {
            let entry = PublishLogEntry {
                published_at: Local::now(),
                title: package.title.clone(),
                content_len: package.content.chars().count(),
                image_count: package.images.len(),
                topics: package.topics.clone(),
                success: true,
                url: receipt.url.clone(),
                message: receipt.message,
            };
            if let Err(e) = log.append(&entry) {
                tracing::warn!(error = %e, "publish succeeded but log append failed");
            }
            events.emit(
                Stage::Done,
                EventStatus::Completed,
                format!(
                    "全自动发布成功！标题: {} (今日 {}/{} 篇)",
                    package.title,
                    today_posts + 1,
                    config.max_daily_posts
                ),
            );
            events.finish(Outcome::Published {
                package,
                url: receipt.url,
                today_posts: today_posts + 1,
            })
        }
        Ok(receipt) => events.finish(Outcome::PublishFailed {
            package,
            message: format!("发布失败: {}", receipt.message),
        }),
        Err(e) => events.finish(Outcome::PublishFailed {
            package,
            message: format!("发布失败: {e}"),
        }),
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
