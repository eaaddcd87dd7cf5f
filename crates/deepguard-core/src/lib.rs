//! # deepguard-core
//!
//! Core types, lifecycle traits, and aggregate statistics for the DeepGuard
//! simulated-analysis engine.
//!
//! Nothing here performs real media analysis: verdicts come from an
//! injectable [`OutcomeGenerator`]. The timed pipelines that drive items
//! through their phases live in `deepguard-pipeline`.

pub mod aggregate;
pub mod defaults;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod outcomes;
pub mod report;

// Re-export commonly used types at crate root
pub use aggregate::{
    dashboard_stats, filtered_mean_confidence, mean_confidence, summarize_alerts,
    summarize_media, summarize_sessions, AlertSummary, DashboardStats, MediaSummary,
    SessionSummary,
};
pub use error::{Error, Result};
pub use events::{EventBus, EventEnvelope, PipelineEvent};
pub use lifecycle::{advance, Assessment, ItemKind, LifecyclePhase, WorkItem};
pub use models::*;
pub use outcomes::{OutcomeGenerator, RandomOutcomes, SequenceOutcomes, SharedOutcomes};
pub use report::{
    export_csv, summarize_reports, write_csv, ReportFilter, ReportRecord, ReportSource,
    ReportSummary, Reportable, CSV_HEADER,
};
