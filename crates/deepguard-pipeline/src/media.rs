//! Media verification pipeline: `uploading → analyzing → completed`.

use tokio::sync::watch;
use tracing::{debug, info, trace};
use uuid::Uuid;

use deepguard_core::defaults::{CONFIDENCE_MAX_EXCLUSIVE, CONFIDENCE_MIN};
use deepguard_core::logging::{CONFIDENCE, ITEM_ID, PHASE, PIPELINE, VERDICT};
use deepguard_core::{
    summarize_media, EventBus, LifecyclePhase, MediaFile, MediaItem, MediaPhase, MediaSummary,
    MediaVerdict, PipelineEvent, ReportRecord, SharedOutcomes, WorkItem,
};

use crate::collection::{ItemCollection, WeakCollection};
use crate::config::PipelineConfig;
use crate::scheduler::Scheduler;

/// Owns the uploaded-media collection and drives each file to a verdict.
pub struct MediaPipeline {
    items: ItemCollection<MediaItem>,
    config: PipelineConfig,
    outcomes: SharedOutcomes,
    scheduler: Scheduler,
    events: EventBus,
}

impl MediaPipeline {
    pub fn new(config: PipelineConfig, outcomes: SharedOutcomes, events: EventBus) -> Self {
        Self {
            items: ItemCollection::new(),
            config,
            outcomes,
            scheduler: Scheduler::new(),
            events,
        }
    }

    /// Submit files for verification. Each file becomes an item in
    /// `uploading` with its own timers; an empty list does nothing.
    pub fn submit(&self, files: &[MediaFile]) -> Vec<Uuid> {
        files.iter().map(|file| self.submit_one(file)).collect()
    }

    fn submit_one(&self, file: &MediaFile) -> Uuid {
        let item = MediaItem::new(file);
        let id = item.id;
        self.items.push_back(item);
        info!(
            { PIPELINE } = "media",
            { ITEM_ID } = %id,
            file = %file.name,
            size_bytes = file.size_bytes,
            "Media submitted"
        );
        self.events.emit(PipelineEvent::ItemSubmitted {
            item_id: id,
            kind: MediaItem::KIND,
        });

        let stage = Stage {
            items: self.items.downgrade(),
            config: self.config.clone(),
            outcomes: self.outcomes.clone(),
            scheduler: self.scheduler,
            events: self.events.clone(),
        };
        self.scheduler
            .after(self.config.media_analyze_delay(), move || stage.analyze(id));
        id
    }

    pub fn snapshot(&self) -> Vec<MediaItem> {
        self.items.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<MediaItem>> {
        self.items.subscribe()
    }

    pub fn get(&self, id: Uuid) -> Option<MediaItem> {
        self.items.get(id)
    }

    pub fn summary(&self) -> MediaSummary {
        summarize_media(&self.items.snapshot())
    }

    /// Report records for every completed item, in submission order.
    pub fn reports(&self) -> Vec<ReportRecord> {
        self.items
            .snapshot()
            .iter()
            .filter_map(ReportRecord::from_media)
            .collect()
    }
}

/// Everything a scheduled phase advance needs, without owning the items.
struct Stage {
    items: WeakCollection<MediaItem>,
    config: PipelineConfig,
    outcomes: SharedOutcomes,
    scheduler: Scheduler,
    events: EventBus,
}

impl Stage {
    fn analyze(self, id: Uuid) {
        let Some(items) = self.items.upgrade() else {
            trace!({ ITEM_ID } = %id, "Media pipeline gone, skipping analysis");
            return;
        };
        if !items.update(id, MediaItem::begin_analysis) {
            return;
        }
        self.announce(id, MediaPhase::Analyzing);

        let delay = self.config.media_complete_delay();
        let scheduler = self.scheduler;
        scheduler.after(delay, move || self.complete(id));
    }

    fn complete(self, id: Uuid) {
        let Some(items) = self.items.upgrade() else {
            trace!({ ITEM_ID } = %id, "Media pipeline gone, skipping completion");
            return;
        };
        let verdict = if self.outcomes.decide(self.config.media_real_probability) {
            MediaVerdict::Real
        } else {
            MediaVerdict::Fake
        };
        let confidence = self
            .outcomes
            .uniform_int(CONFIDENCE_MIN, CONFIDENCE_MAX_EXCLUSIVE) as u8;

        if items.update(id, |item| item.complete(verdict, confidence)) {
            debug!(
                { ITEM_ID } = %id,
                { VERDICT } = verdict.as_str(),
                { CONFIDENCE } = confidence,
                "Media analysis completed"
            );
            self.announce(id, MediaPhase::Completed);
        }
    }

    fn announce(&self, id: Uuid, phase: MediaPhase) {
        debug!({ ITEM_ID } = %id, { PHASE } = phase.as_str(), "Media phase changed");
        self.events.emit(PipelineEvent::PhaseChanged {
            item_id: id,
            kind: MediaItem::KIND,
            phase: phase.as_str().to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepguard_core::SequenceOutcomes;
    use std::time::Duration;
    use tokio::time::sleep;

    fn pipeline(outcomes: SequenceOutcomes) -> MediaPipeline {
        MediaPipeline::new(
            PipelineConfig::default(),
            outcomes.shared(),
            EventBus::new(32),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_submission_is_noop() {
        let p = pipeline(SequenceOutcomes::new());
        assert!(p.submit(&[]).is_empty());
        assert!(p.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_phases_follow_timers() {
        let p = pipeline(
            SequenceOutcomes::new()
                .with_decisions([false])
                .with_ints([97]),
        );
        let ids = p.submit(&[MediaFile::new("clip.mp4", 10 * 1024 * 1024, "video/mp4")]);
        let id = ids[0];
        assert_eq!(p.get(id).unwrap().phase, MediaPhase::Uploading);

        sleep(Duration::from_millis(1_100)).await;
        assert_eq!(p.get(id).unwrap().phase, MediaPhase::Analyzing);
        assert!(p.get(id).unwrap().assessment.is_none());

        sleep(Duration::from_millis(2_000)).await;
        let item = p.get(id).unwrap();
        assert_eq!(item.phase, MediaPhase::Completed);
        assert_eq!(item.verdict(), Some(MediaVerdict::Fake));
        assert_eq!(item.confidence(), Some(97));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_only_include_completed() {
        let p = pipeline(
            SequenceOutcomes::new()
                .with_decisions([true])
                .with_ints([85]),
        );
        p.submit(&[MediaFile::new("a.png", 2048, "image/png")]);
        sleep(Duration::from_millis(1_500)).await;
        assert!(p.reports().is_empty());

        sleep(Duration::from_millis(2_000)).await;
        let reports = p.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].filename, "a.png");
        assert_eq!(reports[0].verdict, MediaVerdict::Real);
        assert_eq!(reports[0].confidence, 85);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_pipeline_skips_timers() {
        let outcomes = std::sync::Arc::new(SequenceOutcomes::new().with_decisions([true]));
        let p = MediaPipeline::new(
            PipelineConfig::default(),
            outcomes.clone(),
            EventBus::new(32),
        );
        p.submit(&[MediaFile::new("a.png", 1, "image/png")]);
        drop(p);
        sleep(Duration::from_millis(5_000)).await;
        assert_eq!(outcomes.decisions_drawn(), 0);
    }
}
