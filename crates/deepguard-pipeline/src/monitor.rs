//! Live monitoring: a recurring ticker that occasionally raises alerts.
//!
//! New alerts go to the front of a bounded stream; the oldest fall off the
//! end. Starting and stopping are idempotent and at most one ticker runs.
//!
//! Each ticker run is tagged with an epoch. A tick applies its mutation only
//! while holding the state lock and only if its epoch is still current, and
//! [`AlertMonitor::stop`] bumps the epoch under that same lock. Once `stop`
//! returns, no tick from the old run can touch the stream.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::watch;
use tracing::{debug, info, trace};
use uuid::Uuid;

use deepguard_core::defaults::{ALERT_MESSAGES, ALERT_SOURCES};
use deepguard_core::logging::{COLLECTION_LEN, ITEM_ID, OPERATION, PIPELINE};
use deepguard_core::outcomes::choose;
use deepguard_core::{
    summarize_alerts, Alert, AlertSummary, EventBus, PipelineEvent, Severity, SharedOutcomes,
    WorkItem,
};

use crate::collection::{ItemCollection, WeakCollection};
use crate::config::PipelineConfig;
use crate::scheduler::{Scheduler, TimerHandle};

#[derive(Default)]
struct MonitorState {
    epoch: u64,
    ticker: Option<TimerHandle>,
}

fn lock(state: &Mutex<MonitorState>) -> MutexGuard<'_, MonitorState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Owns the alert stream and the live-monitoring ticker.
pub struct AlertMonitor {
    alerts: ItemCollection<Alert>,
    config: PipelineConfig,
    outcomes: SharedOutcomes,
    scheduler: Scheduler,
    events: EventBus,
    state: Arc<Mutex<MonitorState>>,
}

impl AlertMonitor {
    /// Create a stopped monitor. Call [`start`](Self::start) to begin ticking.
    pub fn new(config: PipelineConfig, outcomes: SharedOutcomes, events: EventBus) -> Self {
        Self {
            alerts: ItemCollection::with_capacity(config.alert_capacity),
            config,
            outcomes,
            scheduler: Scheduler::new(),
            events,
            state: Arc::new(Mutex::new(MonitorState::default())),
        }
    }

    /// Start the ticker. Returns `false` if it was already running.
    pub fn start(&self) -> bool {
        let mut state = lock(&self.state);
        if state.ticker.is_some() {
            return false;
        }
        state.epoch += 1;
        let tick = Tick {
            epoch: state.epoch,
            state: Arc::downgrade(&self.state),
            alerts: self.alerts.downgrade(),
            outcomes: self.outcomes.clone(),
            events: self.events.clone(),
            raise_probability: self.config.alert_raise_probability,
        };
        state.ticker = Some(
            self.scheduler
                .every(self.config.alert_interval(), move || tick.run()),
        );
        info!(
            { PIPELINE } = "monitor",
            interval_ms = self.config.alert_interval_ms,
            "Live monitoring started"
        );
        self.events.emit(PipelineEvent::MonitoringStarted);
        true
    }

    /// Stop the ticker. Returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        let mut state = lock(&self.state);
        let Some(ticker) = state.ticker.take() else {
            return false;
        };
        state.epoch += 1;
        ticker.cancel();
        info!({ PIPELINE } = "monitor", "Live monitoring stopped");
        self.events.emit(PipelineEvent::MonitoringStopped);
        true
    }

    /// Switch monitoring on or off. Returns whether anything changed.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        if enabled {
            self.start()
        } else {
            self.stop()
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).ticker.is_some()
    }

    /// Mark an active alert acknowledged.
    pub fn acknowledge(&self, id: Uuid) -> bool {
        self.change_status(id, "acknowledge", Alert::acknowledge)
    }

    /// Mark an active alert resolved.
    pub fn resolve(&self, id: Uuid) -> bool {
        self.change_status(id, "resolve", Alert::resolve)
    }

    fn change_status(&self, id: Uuid, op: &'static str, change: fn(&mut Alert) -> bool) -> bool {
        let mut status = None;
        let changed = self.alerts.update(id, |alert| {
            let changed = change(alert);
            status = Some(alert.status);
            changed
        });
        match status {
            Some(status) if changed => {
                debug!({ ITEM_ID } = %id, { OPERATION } = op, status = status.as_str(), "Alert status changed");
                self.events
                    .emit(PipelineEvent::AlertStatusChanged { item_id: id, status });
                true
            }
            _ => {
                trace!({ ITEM_ID } = %id, { OPERATION } = op, "Alert status unchanged");
                false
            }
        }
    }

    pub fn snapshot(&self) -> Vec<Alert> {
        self.alerts.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Alert>> {
        self.alerts.subscribe()
    }

    pub fn get(&self, id: Uuid) -> Option<Alert> {
        self.alerts.get(id)
    }

    pub fn summary(&self) -> AlertSummary {
        summarize_alerts(&self.alerts.snapshot())
    }
}

impl Drop for AlertMonitor {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.epoch += 1;
        if let Some(ticker) = state.ticker.take() {
            ticker.cancel();
        }
    }
}

/// One ticker run's view of the monitor.
struct Tick {
    epoch: u64,
    state: Weak<Mutex<MonitorState>>,
    alerts: WeakCollection<Alert>,
    outcomes: SharedOutcomes,
    events: EventBus,
    raise_probability: f64,
}

impl Tick {
    fn run(&self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let guard = lock(&state);
        if guard.epoch != self.epoch {
            trace!({ PIPELINE } = "monitor", "Stale tick ignored");
            return;
        }
        let Some(alerts) = self.alerts.upgrade() else {
            return;
        };
        if !self.outcomes.decide(self.raise_probability) {
            trace!({ PIPELINE } = "monitor", { OPERATION } = "tick", "No alert this tick");
            return;
        }

        let outcomes = self.outcomes.as_ref();
        let message = choose(outcomes, &ALERT_MESSAGES).copied().unwrap_or_default();
        let severity = choose(outcomes, &Severity::ALL)
            .copied()
            .unwrap_or(Severity::Low);
        let source = choose(outcomes, &ALERT_SOURCES).copied().unwrap_or_default();

        let alert = Alert::new(message, source, severity);
        let id = alert.id;
        let dropped = alerts.push_front(alert);
        drop(guard);

        info!(
            { PIPELINE } = "monitor",
            { ITEM_ID } = %id,
            severity = severity.as_str(),
            source,
            { COLLECTION_LEN } = alerts.len(),
            "Alert raised"
        );
        self.events
            .emit(PipelineEvent::AlertRaised { item_id: id, severity });
        for old in dropped {
            self.events.emit(PipelineEvent::ItemRemoved {
                item_id: old.id,
                kind: Alert::KIND,
            });
        }
    }
}
