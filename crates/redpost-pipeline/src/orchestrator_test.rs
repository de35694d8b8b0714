use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::Local;
use redpost_core::{DataLayout, Mode, PipelineConfig};
use redpost_genai::content::DraftContent;
use redpost_genai::{ContentPackage, GenError};
use redpost_trending::{
    KeywordAnalysis, KeywordScore, Note, TrendingQuery, TrendingSnapshot,
};

use super::*;
use crate::ports::PublishReceipt;
use crate::PipelineError;
use crate::TracingSink;

struct FakeGate {
    logged_in: bool,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeGate {
    fn logged_in() -> Self {
        Self {
            logged_in: true,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn logged_out() -> Self {
        Self {
            logged_in: false,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }
}

impl SessionGate for FakeGate {
    async fn is_logged_in(&self) -> Result<bool, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PipelineError::ExternalCallFailed("bridge died".to_owned()));
        }
        Ok(self.logged_in)
    }
}

struct FakeSource {
    snapshot: Option<TrendingSnapshot>,
    calls: AtomicUsize,
}

impl FakeSource {
    fn returning(snapshot: TrendingSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            snapshot: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl TrendingSource for FakeSource {
    async fn scrape(&self, _query: &TrendingQuery) -> Result<TrendingSnapshot, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .clone()
            .ok_or_else(|| PipelineError::ExternalCallFailed("browser crashed".to_owned()))
    }
}

struct FakeGen {
    image_count: usize,
    fail: bool,
    last_topic: Mutex<Option<String>>,
}

impl FakeGen {
    fn with_images(image_count: usize) -> Self {
        Self {
            image_count,
            fail: false,
            last_topic: Mutex::new(None),
        }
    }

    fn failing() -> Self {
        Self {
            image_count: 0,
            fail: true,
            last_topic: Mutex::new(None),
        }
    }

    fn topic(&self) -> Option<String> {
        self.last_topic.lock().unwrap().clone()
    }
}

impl ContentGenerator for FakeGen {
    async fn generate(
        &self,
        topic: &str,
        style: &str,
        image_count: usize,
        _trending: Option<&TrendingSnapshot>,
    ) -> Result<ContentPackage, GenError> {
        *self.last_topic.lock().unwrap() = Some(topic.to_owned());
        if self.fail {
            return Err(GenError::RecoveryFailed { text_len: 42 });
        }
        let draft = DraftContent {
            title: format!("关于{topic}的笔记"),
            content: "生成的正文".to_owned(),
            topics: vec![topic.to_owned()],
            image_prompts: (0..image_count).map(|i| format!("prompt {i}")).collect(),
        };
        let images = (0..self.image_count.min(image_count))
            .map(|i| PathBuf::from(format!("/tmp/image_{}.png", i + 1)))
            .collect();
        Ok(ContentPackage::assemble(
            draft,
            images,
            topic,
            style,
            Local::now(),
        ))
    }
}

struct FakePublisher {
    success: bool,
    calls: AtomicUsize,
}

impl FakePublisher {
    fn accepting() -> Self {
        Self {
            success: true,
            calls: AtomicUsize::new(0),
        }
    }

    fn rejecting() -> Self {
        Self {
            success: false,
            calls: AtomicUsize::new(0),
        }
    }
}

impl NotePublisher for FakePublisher {
    async fn publish(&self, _request: &PublishRequest) -> Result<PublishReceipt, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PublishReceipt {
            success: self.success,
            url: self.success.then(|| "https://example.com/note/1".to_owned()),
            message: if self.success {
                "ok".to_owned()
            } else {
                "表单提交被拒绝".to_owned()
            },
        })
    }
}

/// Snapshot with a pinned weighted-keyword table, as the external scraper
/// would deliver it.
fn snapshot_with_weighted(notes: Vec<Note>, weighted: &[(&str, u64)]) -> TrendingSnapshot {
    let mut snapshot =
        TrendingSnapshot::new(TrendingQuery::category("综合", 20), Local::now(), notes);
    snapshot.analysis = KeywordAnalysis {
        total_notes: snapshot.notes.len(),
        avg_likes: 0.0,
        top_keywords: Vec::new(),
        top_weighted_keywords: weighted
            .iter()
            .map(|(word, score)| KeywordScore {
                word: (*word).to_owned(),
                score: *score,
            })
            .collect(),
    };
    snapshot
}

fn config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.mode = Mode::Auto;
    config.image_count = 2;
    config
}

fn seed_log(layout: &DataLayout, titles: &[&str]) {
    let log = PublishLog::new(layout.published_dir());
    for title in titles {
        log.append(&PublishLogEntry {
            published_at: Local::now(),
            title: (*title).to_owned(),
            content_len: 10,
            image_count: 1,
            topics: vec![],
            success: true,
            url: None,
            message: "ok".to_owned(),
        })
        .unwrap();
    }
}

#[tokio::test]
async fn quota_reached_makes_zero_external_calls() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    seed_log(&layout, &["一", "二", "三"]);

    let gate = FakeGate::logged_in();
    let source = FakeSource::failing();
    let generator = FakeGen::with_images(2);
    let publisher = FakePublisher::accepting();
    let mut events: Vec<StageEvent> = Vec::new();

    let report = run_pipeline(
        &layout,
        &config(),
        &RunOptions::default(),
        &gate,
        &source,
        &generator,
        &publisher,
        &mut events,
    )
    .await;

    assert!(matches!(
        report.outcome,
        Outcome::QuotaReached {
            today_posts: 3,
            max_daily_posts: 3
        }
    ));
    assert!(!report.outcome.is_failure());
    assert_eq!(gate.calls.load(Ordering::SeqCst), 0);
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
    assert!(report.events.is_empty());
}

#[tokio::test]
async fn logged_out_session_is_auth_required() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());

    let gate = FakeGate::logged_out();
    let source = FakeSource::failing();
    let generator = FakeGen::with_images(2);
    let publisher = FakePublisher::accepting();

    let report = run_pipeline(
        &layout,
        &config(),
        &RunOptions::default(),
        &gate,
        &source,
        &generator,
        &publisher,
        &mut TracingSink,
    )
    .await;

    assert!(matches!(report.outcome, Outcome::AuthRequired { .. }));
    assert!(report.outcome.is_failure());
    assert_eq!(source.calls.load(Ordering::SeqCst), 0, "no scrape after auth failure");
}

#[tokio::test]
async fn auth_check_error_is_auth_required() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());

    let gate = FakeGate {
        logged_in: true,
        fail: true,
        calls: AtomicUsize::new(0),
    };
    let report = run_pipeline(
        &layout,
        &config(),
        &RunOptions::default(),
        &gate,
        &FakeSource::failing(),
        &FakeGen::with_images(2),
        &FakePublisher::accepting(),
        &mut TracingSink,
    )
    .await;

    assert!(matches!(report.outcome, Outcome::AuthRequired { .. }));
}

#[tokio::test]
async fn preview_mode_stops_before_publishing() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    let mut preview_config = config();
    preview_config.mode = Mode::Preview;

    let source = FakeSource::returning(snapshot_with_weighted(
        vec![Note::new("AI摄影技巧", 500)],
        &[("摄影", 500)],
    ));
    let publisher = FakePublisher::accepting();

    let report = run_pipeline(
        &layout,
        &preview_config,
        &RunOptions::default(),
        &FakeGate::logged_in(),
        &source,
        &FakeGen::with_images(2),
        &publisher,
        &mut TracingSink,
    )
    .await;

    match &report.outcome {
        Outcome::Preview { package } => {
            assert_eq!(package.topic, "摄影");
            assert!(!package.title.is_empty());
        }
        other => panic!("expected Preview, got: {other:?}"),
    }
    assert!(!report.outcome.is_failure());
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn auto_mode_publishes_and_appends_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());

    let source = FakeSource::returning(snapshot_with_weighted(
        vec![Note::new("AI摄影技巧", 500), Note::new("咖啡拉花入门", 200)],
        &[("摄影", 500), ("咖啡", 200)],
    ));
    let generator = FakeGen::with_images(2);
    let publisher = FakePublisher::accepting();

    let report = run_pipeline(
        &layout,
        &config(),
        &RunOptions::default(),
        &FakeGate::logged_in(),
        &source,
        &generator,
        &publisher,
        &mut TracingSink,
    )
    .await;

    match &report.outcome {
        Outcome::Published {
            package,
            url,
            today_posts,
        } => {
            assert_eq!(package.topic, "摄影");
            assert_eq!(url.as_deref(), Some("https://example.com/note/1"));
            assert_eq!(*today_posts, 1);
        }
        other => panic!("expected Published, got: {other:?}"),
    }
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(generator.topic().as_deref(), Some("摄影"));

    let log = PublishLog::new(layout.published_dir());
    assert_eq!(log.count_today().unwrap(), 1);
    assert!(log.published_titles().contains("关于摄影的笔记"));
}

#[tokio::test]
async fn zero_image_package_downgrades_auto_publish() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());

    let source = FakeSource::returning(snapshot_with_weighted(
        vec![Note::new("AI摄影技巧", 500)],
        &[("摄影", 500)],
    ));
    let generator = FakeGen::with_images(0);
    let publisher = FakePublisher::accepting();

    let report = run_pipeline(
        &layout,
        &config(),
        &RunOptions::default(),
        &FakeGate::logged_in(),
        &source,
        &generator,
        &publisher,
        &mut TracingSink,
    )
    .await;

    match &report.outcome {
        Outcome::PublishSkipped { package, .. } => {
            // The preview-shaped payload keeps the generated work.
            assert_eq!(package.title, "关于摄影的笔记");
            assert_eq!(package.content, "生成的正文");
            assert_eq!(package.topics, vec!["摄影"]);
            assert!(package.images.is_empty());
        }
        other => panic!("expected PublishSkipped, got: {other:?}"),
    }
    assert!(report.outcome.is_failure());
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);

    let log = PublishLog::new(layout.published_dir());
    assert_eq!(log.count_today().unwrap(), 0, "nothing may be logged");
}

#[tokio::test]
async fn scrape_failure_falls_back_to_saved_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    let saved = snapshot_with_weighted(vec![Note::new("AI摄影技巧", 500)], &[("摄影", 500)]);
    redpost_trending::save_snapshot(&layout.trending_dir(), &saved).unwrap();

    let source = FakeSource::failing();
    let generator = FakeGen::with_images(2);

    let report = run_pipeline(
        &layout,
        &config(),
        &RunOptions::default(),
        &FakeGate::logged_in(),
        &source,
        &generator,
        &FakePublisher::accepting(),
        &mut TracingSink,
    )
    .await;

    assert!(matches!(report.outcome, Outcome::Published { .. }));
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(generator.topic().as_deref(), Some("摄影"));
    assert!(report
        .events
        .iter()
        .any(|e| e.status == EventStatus::Warning && e.stage == Stage::ScrapingTrending));
}

#[tokio::test]
async fn skip_trending_reuses_the_latest_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    let saved = snapshot_with_weighted(vec![Note::new("AI摄影技巧", 500)], &[("摄影", 500)]);
    redpost_trending::save_snapshot(&layout.trending_dir(), &saved).unwrap();

    let source = FakeSource::failing();
    let generator = FakeGen::with_images(2);
    let options = RunOptions {
        skip_trending: true,
        ..RunOptions::default()
    };

    let report = run_pipeline(
        &layout,
        &config(),
        &options,
        &FakeGate::logged_in(),
        &source,
        &generator,
        &FakePublisher::accepting(),
        &mut TracingSink,
    )
    .await;

    assert!(matches!(report.outcome, Outcome::Published { .. }));
    assert_eq!(source.calls.load(Ordering::SeqCst), 0, "scrape must be skipped");
    assert_eq!(generator.topic().as_deref(), Some("摄影"));
}

#[tokio::test]
async fn dedup_skips_already_published_topics() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    seed_log(&layout, &["摄影"]);

    let source = FakeSource::returning(snapshot_with_weighted(
        vec![Note::new("摄影", 500), Note::new("咖啡拉花入门", 200)],
        &[("摄影", 500), ("咖啡", 200)],
    ));
    let generator = FakeGen::with_images(2);

    let report = run_pipeline(
        &layout,
        &config(),
        &RunOptions::default(),
        &FakeGate::logged_in(),
        &source,
        &generator,
        &FakePublisher::accepting(),
        &mut TracingSink,
    )
    .await;

    assert!(matches!(report.outcome, Outcome::Published { .. }));
    assert_eq!(generator.topic().as_deref(), Some("咖啡"));
}

#[tokio::test]
async fn no_snapshot_falls_back_to_category_topic() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());

    let generator = FakeGen::with_images(2);
    let options = RunOptions {
        category: Some("科技".to_owned()),
        ..RunOptions::default()
    };

    run_pipeline(
        &layout,
        &config(),
        &options,
        &FakeGate::logged_in(),
        &FakeSource::failing(),
        &generator,
        &FakePublisher::accepting(),
        &mut TracingSink,
    )
    .await;

    assert_eq!(generator.topic().as_deref(), Some("科技"));
}

#[tokio::test]
async fn generic_category_falls_back_to_the_fixed_topic() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());

    let generator = FakeGen::with_images(2);

    run_pipeline(
        &layout,
        &config(),
        &RunOptions::default(),
        &FakeGate::logged_in(),
        &FakeSource::failing(),
        &generator,
        &FakePublisher::accepting(),
        &mut TracingSink,
    )
    .await;

    assert_eq!(generator.topic().as_deref(), Some("生活分享"));
}

#[tokio::test]
async fn generation_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());

    let generator = FakeGen::failing();
    let publisher = FakePublisher::accepting();

    let report = run_pipeline(
        &layout,
        &config(),
        &RunOptions::default(),
        &FakeGate::logged_in(),
        &FakeSource::failing(),
        &generator,
        &publisher,
        &mut TracingSink,
    )
    .await;

    assert!(matches!(report.outcome, Outcome::GenerationFailed { .. }));
    assert!(report.outcome.is_failure());
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn publish_rejection_preserves_the_package() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());

    let source = FakeSource::returning(snapshot_with_weighted(
        vec![Note::new("AI摄影技巧", 500)],
        &[("摄影", 500)],
    ));
    let publisher = FakePublisher::rejecting();

    let report = run_pipeline(
        &layout,
        &config(),
        &RunOptions::default(),
        &FakeGate::logged_in(),
        &source,
        &FakeGen::with_images(2),
        &publisher,
        &mut TracingSink,
    )
    .await;

    match &report.outcome {
        Outcome::PublishFailed { package, message } => {
            assert_eq!(package.title, "关于摄影的笔记");
            assert!(message.contains("表单提交被拒绝"));
        }
        other => panic!("expected PublishFailed, got: {other:?}"),
    }
    assert!(report.outcome.is_failure());

    let log = PublishLog::new(layout.published_dir());
    assert_eq!(log.count_today().unwrap(), 0, "failed publish is not logged");
}
