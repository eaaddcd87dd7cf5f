//! Secure-browser sandbox sessions: `loading → {active | blocked} → completed`.
//!
//! The security check is drawn when the session is opened but only takes
//! effect when loading finishes. A user close moves an `active` or `blocked`
//! session to `completed`; it is then removed after the linger delay.

use tokio::sync::watch;
use tracing::{debug, info, trace};
use uuid::Uuid;

use deepguard_core::defaults::{
    CONFIDENCE_MAX_EXCLUSIVE, CONFIDENCE_MIN, SESSION_DURATION_MAX_MINUTES,
    SESSION_DURATION_MIN_MINUTES, SESSION_THREATS_MAX, SESSION_THREATS_MIN,
};
use deepguard_core::logging::{ITEM_ID, OPERATION, PHASE, PIPELINE};
use deepguard_core::{
    summarize_sessions, BrowseSession, EventBus, LifecyclePhase, PipelineEvent, SessionPhase,
    SessionSummary, SharedOutcomes, WorkItem,
};

use crate::collection::{ItemCollection, WeakCollection};
use crate::config::PipelineConfig;
use crate::scheduler::Scheduler;

/// Owns the sandbox session collection.
pub struct SandboxBrowser {
    sessions: ItemCollection<BrowseSession>,
    config: PipelineConfig,
    outcomes: SharedOutcomes,
    scheduler: Scheduler,
    events: EventBus,
}

impl SandboxBrowser {
    pub fn new(config: PipelineConfig, outcomes: SharedOutcomes, events: EventBus) -> Self {
        Self {
            sessions: ItemCollection::new(),
            config,
            outcomes,
            scheduler: Scheduler::new(),
            events,
        }
    }

    /// Open `url` in a sandbox session.
    ///
    /// A URL that is blank after trimming is ignored and yields `None`.
    pub fn open(&self, url: &str) -> Option<Uuid> {
        if url.trim().is_empty() {
            trace!({ PIPELINE } = "browser", "Ignoring blank URL");
            return None;
        }
        let secure = self.outcomes.decide(self.config.session_secure_probability);
        let session = BrowseSession::new(url, secure)?;
        let id = session.id;
        info!({ PIPELINE } = "browser", { ITEM_ID } = %id, url = %session.url, "Sandbox session opened");
        self.sessions.push_back(session);
        self.events.emit(PipelineEvent::ItemSubmitted {
            item_id: id,
            kind: BrowseSession::KIND,
        });

        let sessions = self.sessions.downgrade();
        let outcomes = self.outcomes.clone();
        let events = self.events.clone();
        self.scheduler.after(self.config.session_load_delay(), move || {
            finish_loading(&sessions, &outcomes, &events, id)
        });
        Some(id)
    }

    /// Close an `active` or `blocked` session.
    ///
    /// Returns `false` (and changes nothing) for unknown ids, sessions
    /// still loading, and sessions already closed.
    pub fn close(&self, id: Uuid) -> bool {
        let outcomes = &self.outcomes;
        let closed = self.sessions.update(id, |s| {
            if !s.can_close() {
                return false;
            }
            let minutes = outcomes.uniform_int(
                SESSION_DURATION_MIN_MINUTES,
                SESSION_DURATION_MAX_MINUTES + 1,
            );
            let confidence = outcomes.uniform_int(CONFIDENCE_MIN, CONFIDENCE_MAX_EXCLUSIVE);
            s.close(minutes as u32, confidence as u8)
        });
        if !closed {
            trace!({ ITEM_ID } = %id, { OPERATION } = "close", "Close ignored");
            return false;
        }
        announce(&self.events, id, SessionPhase::Completed);

        let sessions = self.sessions.downgrade();
        let events = self.events.clone();
        self.scheduler.after(self.config.session_linger(), move || {
            if let Some(sessions) = sessions.upgrade() {
                if sessions.remove(id) {
                    debug!({ ITEM_ID } = %id, "Completed session removed");
                    events.emit(PipelineEvent::ItemRemoved {
                        item_id: id,
                        kind: BrowseSession::KIND,
                    });
                }
            }
        });
        true
    }

    pub fn snapshot(&self) -> Vec<BrowseSession> {
        self.sessions.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<BrowseSession>> {
        self.sessions.subscribe()
    }

    pub fn get(&self, id: Uuid) -> Option<BrowseSession> {
        self.sessions.get(id)
    }

    pub fn summary(&self) -> SessionSummary {
        summarize_sessions(&self.sessions.snapshot())
    }
}

fn finish_loading(
    sessions: &WeakCollection<BrowseSession>,
    outcomes: &SharedOutcomes,
    events: &EventBus,
    id: Uuid,
) {
    let Some(sessions) = sessions.upgrade() else {
        trace!({ ITEM_ID } = %id, "Browser gone, skipping load completion");
        return;
    };
    let mut phase = None;
    sessions.update(id, |s| {
        let threats = if s.passed_security_check() {
            0
        } else {
            outcomes.uniform_int(SESSION_THREATS_MIN, SESSION_THREATS_MAX + 1)
        };
        let changed = s.finish_loading(threats as u8);
        if changed {
            phase = Some(s.phase);
        }
        changed
    });
    if let Some(phase) = phase {
        announce(events, id, phase);
    }
}

fn announce(events: &EventBus, id: Uuid, phase: SessionPhase) {
    debug!({ ITEM_ID } = %id, { PHASE } = phase.as_str(), "Session phase changed");
    events.emit(PipelineEvent::PhaseChanged {
        item_id: id,
        kind: BrowseSession::KIND,
        phase: phase.as_str().to_string(),
    });
}
