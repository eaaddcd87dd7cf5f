//! Pipeline event types, envelope, and event bus.
//!
//! Every pipeline publishes what it does to a shared [`EventBus`] so the
//! presentation layer (or a test) can follow along without polling
//! snapshots. Events are informational: nothing in the pipelines depends on
//! them being delivered.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Result;
use crate::lifecycle::ItemKind;
use crate::models::{AlertStatus, Severity};

/// Wrapper adding identity and timing to a [`PipelineEvent`].
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// Dot-namespaced event type (e.g. `"item.phase_changed"`).
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub payload: PipelineEvent,
}

impl EventEnvelope {
    pub fn new(event: PipelineEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            payload: event,
        }
    }

    /// Single-line JSON form, as written to structured logs.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Something a pipeline did.
///
/// Serialized with a `type` tag, e.g.
/// `{"type":"PhaseChanged","item_id":"...","kind":"media","phase":"analyzing"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// A work item entered its collection.
    ItemSubmitted { item_id: Uuid, kind: ItemKind },
    /// A work item moved to a new phase.
    PhaseChanged {
        item_id: Uuid,
        kind: ItemKind,
        phase: String,
    },
    /// A work item left its collection (linger expiry or stream truncation).
    ItemRemoved { item_id: Uuid, kind: ItemKind },
    /// The monitor raised a synthetic alert.
    AlertRaised { item_id: Uuid, severity: Severity },
    /// A user changed an alert's triage status.
    AlertStatusChanged { item_id: Uuid, status: AlertStatus },
    /// Live monitoring was switched on.
    MonitoringStarted,
    /// Live monitoring was switched off.
    MonitoringStopped,
}

impl PipelineEvent {
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            PipelineEvent::ItemSubmitted { .. } => "item.submitted",
            PipelineEvent::PhaseChanged { .. } => "item.phase_changed",
            PipelineEvent::ItemRemoved { .. } => "item.removed",
            PipelineEvent::AlertRaised { .. } => "alert.raised",
            PipelineEvent::AlertStatusChanged { .. } => "alert.status_changed",
            PipelineEvent::MonitoringStarted => "monitoring.started",
            PipelineEvent::MonitoringStopped => "monitoring.stopped",
        }
    }

    /// The item this event concerns, if any.
    pub fn item_id(&self) -> Option<Uuid> {
        match self {
            PipelineEvent::ItemSubmitted { item_id, .. }
            | PipelineEvent::PhaseChanged { item_id, .. }
            | PipelineEvent::ItemRemoved { item_id, .. }
            | PipelineEvent::AlertRaised { item_id, .. }
            | PipelineEvent::AlertStatusChanged { item_id, .. } => Some(*item_id),
            PipelineEvent::MonitoringStarted | PipelineEvent::MonitoringStopped => None,
        }
    }
}

/// Broadcast bus shared by all pipelines.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event to all subscribers.
    ///
    /// With no subscribers the event is silently dropped.
    pub fn emit(&self, event: PipelineEvent) {
        let envelope = EventEnvelope::new(event);
        tracing::trace!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive events. Each subscriber gets its own stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
