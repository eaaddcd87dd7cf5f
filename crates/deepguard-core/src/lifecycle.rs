//! Lifecycle traits shared by every work item kind.
//!
//! A work item moves through a fixed, forward-only phase ordering. The
//! ordering is expressed as a rank; phases sharing a rank are alternative
//! branches (a sandbox session becomes `active` *or* `blocked`), so moving
//! between them is rejected just like moving backwards.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which pipeline owns an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Media,
    BrowseSession,
    Alert,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Media => "media",
            ItemKind::BrowseSession => "browse-session",
            ItemKind::Alert => "alert",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A phase in a forward-only lifecycle.
pub trait LifecyclePhase: Copy + Eq + Debug + Send + Sync + 'static {
    /// Position in the kind's ordering. Higher is later.
    fn rank(self) -> u8;

    /// Whether no further phase follows.
    fn is_terminal(self) -> bool;

    /// Stable lowercase name, used in logs and events.
    fn as_str(self) -> &'static str;

    /// Whether moving to `next` is a forward step.
    fn can_advance_to(self, next: Self) -> bool {
        next.rank() > self.rank()
    }
}

/// Move `current` to `next` if that is a forward step.
///
/// Returns `false` and leaves `current` untouched otherwise.
pub fn advance<P: LifecyclePhase>(current: &mut P, next: P) -> bool {
    if current.can_advance_to(next) {
        *current = next;
        true
    } else {
        false
    }
}

/// Terminal classification plus its confidence.
///
/// Holding both in one value keeps them present or absent together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment<V> {
    pub verdict: V,
    /// Synthetic confidence, 0-100.
    pub confidence: u8,
}

impl<V> Assessment<V> {
    pub fn new(verdict: V, confidence: u8) -> Self {
        Self {
            verdict,
            confidence: confidence.min(100),
        }
    }
}

/// Common view over every work item kind.
pub trait WorkItem: Clone + Debug + Send + Sync + 'static {
    type Phase: LifecyclePhase;

    const KIND: ItemKind;

    fn id(&self) -> Uuid;

    fn phase(&self) -> Self::Phase;

    fn created_at(&self) -> DateTime<Utc>;

    /// Human-readable label: file name, URL, or alert message.
    fn display_name(&self) -> &str;
}
