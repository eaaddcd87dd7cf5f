//! # deepguard-pipeline
//!
//! Timer-driven simulated analysis pipelines for the DeepGuard dashboard.
//!
//! This crate provides:
//! - Insertion-ordered item collections published through `watch` channels
//! - A non-blocking timer scheduler on the Tokio runtime
//! - Media verification, sandbox browsing and live alert monitoring
//! - Environment-driven timing configuration
//!
//! ## Example
//!
//! ```ignore
//! use deepguard_pipeline::{Dashboard, PipelineConfig};
//! use deepguard_core::{MediaFile, RandomOutcomes};
//!
//! let dashboard = Dashboard::new(PipelineConfig::from_env(), RandomOutcomes::shared());
//!
//! // Follow every pipeline event
//! let mut events = dashboard.events().subscribe();
//!
//! dashboard
//!     .media()
//!     .submit(&[MediaFile::new("clip.mp4", 10 * 1024 * 1024, "video/mp4")]);
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{}: {:?}", event.event_type, event.payload);
//! }
//! ```

pub mod browser;
pub mod collection;
pub mod config;
pub mod media;
pub mod monitor;
pub mod scheduler;

// Re-export core types
pub use deepguard_core::*;

pub use browser::SandboxBrowser;
pub use collection::{ItemCollection, WeakCollection};
pub use config::PipelineConfig;
pub use media::MediaPipeline;
pub use monitor::AlertMonitor;
pub use scheduler::{Scheduler, TimerHandle};

/// The three pipelines wired to one event bus.
pub struct Dashboard {
    media: MediaPipeline,
    browser: SandboxBrowser,
    monitor: AlertMonitor,
    events: EventBus,
}

impl Dashboard {
    /// Build all pipelines. Starts live monitoring when the config enables
    /// it, so this must be called from within a Tokio runtime.
    pub fn new(config: PipelineConfig, outcomes: SharedOutcomes) -> Self {
        let events = EventBus::default();
        let dashboard = Self {
            media: MediaPipeline::new(config.clone(), outcomes.clone(), events.clone()),
            browser: SandboxBrowser::new(config.clone(), outcomes.clone(), events.clone()),
            monitor: AlertMonitor::new(config.clone(), outcomes, events.clone()),
            events,
        };
        if config.monitoring_enabled {
            dashboard.monitor.start();
        }
        dashboard
    }

    pub fn media(&self) -> &MediaPipeline {
        &self.media
    }

    pub fn browser(&self) -> &SandboxBrowser {
        &self.browser
    }

    pub fn monitor(&self) -> &AlertMonitor {
        &self.monitor
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Headline counters across the media and session collections.
    pub fn stats(&self) -> DashboardStats {
        dashboard_stats(&self.media.snapshot(), &self.browser.snapshot())
    }
}
