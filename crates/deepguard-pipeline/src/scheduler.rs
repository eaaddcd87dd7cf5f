//! Non-blocking timers on the Tokio runtime.
//!
//! One-shot timers back the per-item phase advances and are fire-and-forget:
//! dropping the [`TimerHandle`] does not cancel them. Recurring timers back
//! the alert ticker and are cancelled explicitly through their handle.
//!
//! Both must be created from within a Tokio runtime.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::trace;

use deepguard_core::logging::DELAY_MS;

/// Handle to a scheduled timer task.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Stop the timer. A callback that has not started will not run.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns delayed and recurring callbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    pub fn new() -> Self {
        Self
    }

    /// Run `callback` once after `delay`.
    pub fn after<F>(&self, delay: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        trace!({ DELAY_MS } = delay.as_millis() as u64, "Scheduling one-shot timer");
        let task = tokio::spawn(async move {
            sleep(delay).await;
            callback();
        });
        TimerHandle { task }
    }

    /// Run `callback` every `period`, first firing one period from now.
    ///
    /// Missed ticks are not replayed; a late tick pushes the next one back.
    pub fn every<F>(&self, period: Duration, mut callback: F) -> TimerHandle
    where
        F: FnMut() + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        trace!({ DELAY_MS } = period.as_millis() as u64, "Scheduling recurring timer");
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback();
            }
        });
        TimerHandle { task }
    }
}
