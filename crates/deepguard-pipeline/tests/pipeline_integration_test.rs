//! End-to-end behaviour of the three pipelines on virtual time.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use deepguard_pipeline::{
    filtered_mean_confidence, AlertMonitor, EventBus, MediaFile, MediaPhase, MediaPipeline,
    MediaType, MediaVerdict, PipelineConfig, PipelineEvent, RandomOutcomes, ReportFilter,
    SandboxBrowser, SequenceOutcomes, SessionPhase, SessionVerdict,
};

fn quiet_config() -> PipelineConfig {
    PipelineConfig::default().with_monitoring_enabled(false)
}

#[tokio::test(start_paused = true)]
async fn test_every_media_item_completes_with_confidence_in_band() {
    let pipeline = MediaPipeline::new(quiet_config(), RandomOutcomes::shared(), EventBus::default());
    let files: Vec<_> = (0..25)
        .map(|i| MediaFile::new(format!("file-{i}.jpg"), 4_096, "image/jpeg"))
        .collect();
    pipeline.submit(&files);

    sleep(Duration::from_millis(3_100)).await;
    let items = pipeline.snapshot();
    assert_eq!(items.len(), 25);
    for item in items {
        assert_eq!(item.phase, MediaPhase::Completed);
        assert!(item.verdict().is_some());
        let confidence = item.confidence().unwrap();
        assert!((80..100).contains(&confidence), "confidence {confidence}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_clip_mp4_end_to_end() {
    let events = EventBus::default();
    let mut rx = events.subscribe();
    let pipeline = MediaPipeline::new(quiet_config(), RandomOutcomes::shared(), events);

    let ids = pipeline.submit(&[MediaFile::new("clip.mp4", 10 * 1024 * 1024, "video/mp4")]);
    let id = ids[0];

    let item = pipeline.get(id).unwrap();
    assert_eq!(item.phase, MediaPhase::Uploading);
    assert_eq!(item.media_type, MediaType::Video);
    assert_eq!(item.size_display, "10.0 MB");

    sleep(Duration::from_millis(1_100)).await;
    assert_eq!(pipeline.get(id).unwrap().phase, MediaPhase::Analyzing);

    sleep(Duration::from_millis(2_000)).await;
    let item = pipeline.get(id).unwrap();
    assert_eq!(item.phase, MediaPhase::Completed);
    assert!(matches!(
        item.verdict(),
        Some(MediaVerdict::Real) | Some(MediaVerdict::Fake)
    ));
    assert!((80..100).contains(&item.confidence().unwrap()));

    let phases: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter_map(|e| match e.payload {
            PipelineEvent::PhaseChanged { phase, .. } => Some(phase),
            _ => None,
        })
        .collect();
    assert_eq!(phases, vec!["analyzing", "completed"]);
}

#[tokio::test(start_paused = true)]
async fn test_sessions_branch_to_active_or_blocked() {
    let browser = SandboxBrowser::new(
        quiet_config(),
        SequenceOutcomes::new()
            .with_decisions([true, false, false])
            .with_ints([1, 5, 9])
            .shared(),
        EventBus::default(),
    );
    let a = browser.open("https://news-website.com").unwrap();
    let b = browser.open("https://phishing-attempt.net").unwrap();
    let c = browser.open("https://unknown-site.org").unwrap();

    sleep(Duration::from_millis(2_100)).await;
    let a = browser.get(a).unwrap();
    assert_eq!(a.phase, SessionPhase::Active);
    assert_eq!(a.threat_count, Some(0));
    for id in [b, c] {
        let s = browser.get(id).unwrap();
        assert_eq!(s.phase, SessionPhase::Blocked);
        let threats = s.threat_count.unwrap();
        assert!((1..=5).contains(&threats), "threats {threats}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_blank_urls_create_nothing() {
    let browser = SandboxBrowser::new(quiet_config(), RandomOutcomes::shared(), EventBus::default());
    assert!(browser.open("").is_none());
    assert!(browser.open(" \t ").is_none());
    assert!(browser.snapshot().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_completed_session_lingers_then_disappears() {
    let browser = SandboxBrowser::new(
        quiet_config(),
        SequenceOutcomes::new().with_decisions([false]).shared(),
        EventBus::default(),
    );
    let id = browser.open("https://phishing-attempt.net").unwrap();
    sleep(Duration::from_millis(2_100)).await;

    assert!(browser.close(id));
    let closed = browser.get(id).unwrap();
    assert_eq!(closed.phase, SessionPhase::Completed);
    assert_eq!(closed.verdict(), Some(SessionVerdict::Blocked));
    assert!((5..=34).contains(&closed.duration_minutes.unwrap()));

    sleep(Duration::from_millis(2_000)).await;
    assert!(browser.get(id).is_some());
    sleep(Duration::from_millis(2_000)).await;
    assert!(browser.get(id).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_toggling_monitoring_never_runs_two_tickers() {
    let outcomes = Arc::new(SequenceOutcomes::new().with_decisions([false]));
    let monitor = AlertMonitor::new(quiet_config(), outcomes.clone(), EventBus::default());

    assert!(monitor.set_enabled(true));
    assert!(monitor.set_enabled(false));
    assert!(monitor.set_enabled(true));
    assert!(!monitor.set_enabled(true));

    sleep(Duration::from_millis(8_100)).await;
    assert_eq!(outcomes.decisions_drawn(), 1);
    sleep(Duration::from_millis(8_000)).await;
    assert_eq!(outcomes.decisions_drawn(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_eleventh_alert_drops_the_oldest() {
    let events = EventBus::default();
    let mut rx = events.subscribe();
    let monitor = AlertMonitor::new(
        quiet_config(),
        SequenceOutcomes::new().with_decisions([true]).shared(),
        events,
    );
    monitor.start();

    sleep(Duration::from_millis(8_000 * 10 + 100)).await;
    let first_ten = monitor.snapshot();
    assert_eq!(first_ten.len(), 10);
    let oldest = first_ten[9].id;
    let newest = first_ten[0].id;

    sleep(Duration::from_millis(8_000)).await;
    let alerts = monitor.snapshot();
    assert_eq!(alerts.len(), 10);
    assert!(alerts.iter().all(|a| a.id != oldest));
    assert_eq!(alerts[1].id, newest);

    let removed: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter_map(|e| match e.payload {
            PipelineEvent::ItemRemoved { item_id, .. } => Some(item_id),
            _ => None,
        })
        .collect();
    assert_eq!(removed, vec![oldest]);
}

#[tokio::test(start_paused = true)]
async fn test_alert_triage_is_one_way() {
    let monitor = AlertMonitor::new(
        quiet_config(),
        SequenceOutcomes::new().with_decisions([true]).shared(),
        EventBus::default(),
    );
    monitor.start();
    sleep(Duration::from_millis(8_100)).await;
    monitor.stop();
    let id = monitor.snapshot()[0].id;

    assert!(monitor.resolve(id));
    assert!(!monitor.resolve(id));
    assert!(!monitor.acknowledge(id));
    assert_eq!(monitor.summary().resolved, 1);
}

#[tokio::test(start_paused = true)]
async fn test_mean_confidence_of_empty_subset_is_zero() {
    let pipeline = MediaPipeline::new(
        quiet_config(),
        SequenceOutcomes::new()
            .with_decisions([true])
            .with_ints([88])
            .shared(),
        EventBus::default(),
    );
    pipeline.submit(&[MediaFile::new("holiday.png", 1_024, "image/png")]);
    sleep(Duration::from_millis(3_100)).await;

    let reports = pipeline.reports();
    let none = ReportFilter::new().with_verdict(MediaVerdict::Fake);
    assert_eq!(filtered_mean_confidence(&reports, &none), 0.0);

    let all = ReportFilter::new();
    assert_eq!(filtered_mean_confidence(&reports, &all), 88.0);
}
