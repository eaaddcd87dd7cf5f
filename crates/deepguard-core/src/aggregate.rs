//! Aggregate recompute layer.
//!
//! Every function here is a pure function of a collection snapshot. Callers
//! recompute on each published snapshot instead of patching counters, so the
//! numbers can never drift from the items they describe.

use serde::Serialize;

use crate::models::{
    Alert, AlertStatus, BrowseSession, MediaItem, MediaPhase, MediaVerdict, SessionPhase,
    SessionVerdict, Severity,
};
use crate::report::{ReportFilter, Reportable};

/// Mean of the given confidence scores; `0.0` for an empty input.
pub fn mean_confidence<I>(scores: I) -> f64
where
    I: IntoIterator<Item = u8>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), s| (sum + u64::from(s), count + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Mean confidence of the items matching `filter`, ignoring items that
/// have no score yet. `0.0` when nothing qualifies.
pub fn filtered_mean_confidence<R: Reportable>(items: &[R], filter: &ReportFilter) -> f64 {
    mean_confidence(
        items
            .iter()
            .filter(|r| filter.matches(*r))
            .filter_map(|r| r.confidence()),
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MediaSummary {
    pub total: usize,
    /// Items still uploading or analyzing.
    pub pending: usize,
    pub real: usize,
    pub fake: usize,
    pub mean_confidence: f64,
}

pub fn summarize_media(items: &[MediaItem]) -> MediaSummary {
    let mut summary = MediaSummary {
        total: items.len(),
        ..Default::default()
    };
    for item in items {
        match item.verdict() {
            Some(MediaVerdict::Real) => summary.real += 1,
            Some(MediaVerdict::Fake) => summary.fake += 1,
            None => {}
        }
        if item.phase != MediaPhase::Completed {
            summary.pending += 1;
        }
    }
    summary.mean_confidence = mean_confidence(items.iter().filter_map(|i| i.confidence()));
    summary
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub total: usize,
    pub loading: usize,
    pub active: usize,
    pub blocked: usize,
    pub completed: usize,
    /// Completed sessions judged safe.
    pub safe_verdicts: usize,
    /// Completed sessions judged blocked.
    pub blocked_verdicts: usize,
}

pub fn summarize_sessions(sessions: &[BrowseSession]) -> SessionSummary {
    let mut summary = SessionSummary {
        total: sessions.len(),
        ..Default::default()
    };
    for s in sessions {
        match s.phase {
            SessionPhase::Loading => summary.loading += 1,
            SessionPhase::Active => summary.active += 1,
            SessionPhase::Blocked => summary.blocked += 1,
            SessionPhase::Completed => summary.completed += 1,
        }
        match s.verdict() {
            Some(SessionVerdict::Safe) => summary.safe_verdicts += 1,
            Some(SessionVerdict::Blocked) => summary.blocked_verdicts += 1,
            None => {}
        }
    }
    summary
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub total: usize,
    pub active: usize,
    /// Critical alerts that are still active.
    pub critical_active: usize,
    pub acknowledged: usize,
    pub resolved: usize,
}

pub fn summarize_alerts(alerts: &[Alert]) -> AlertSummary {
    let mut summary = AlertSummary {
        total: alerts.len(),
        ..Default::default()
    };
    for a in alerts {
        match a.status {
            AlertStatus::Active => {
                summary.active += 1;
                if a.severity == Severity::Critical {
                    summary.critical_active += 1;
                }
            }
            AlertStatus::Acknowledged => summary.acknowledged += 1,
            AlertStatus::Resolved => summary.resolved += 1,
        }
    }
    summary
}

/// Headline counters for the dashboard home view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub media_verified: usize,
    pub deepfakes_detected: usize,
    pub links_opened_safely: usize,
}

pub fn dashboard_stats(media: &[MediaItem], sessions: &[BrowseSession]) -> DashboardStats {
    DashboardStats {
        media_verified: media
            .iter()
            .filter(|m| m.phase == MediaPhase::Completed)
            .count(),
        deepfakes_detected: media
            .iter()
            .filter(|m| m.verdict() == Some(MediaVerdict::Fake))
            .count(),
        links_opened_safely: sessions
            .iter()
            .filter(|s| {
                s.phase == SessionPhase::Active || s.verdict() == Some(SessionVerdict::Safe)
            })
            .count(),
    }
}
