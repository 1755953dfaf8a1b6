//! Application service: adaptive poll loop.
//!
//! Cycles run strictly one after another. The delay before the next cycle is
//! short while a decay counter is positive and long otherwise; new log data
//! refills the counter.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::application::ports::{BackendApi, UiObserver};
use crate::application::services::reconcile::ChatSession;
use crate::domain::config::PollConfig;

/// Decay counter and the two intervals it selects between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollCadence {
    short: Duration,
    long: Duration,
    budget: u32,
    counter: u32,
}

impl PollCadence {
    #[must_use]
    pub fn new(short: Duration, long: Duration, budget: u32) -> Self {
        Self {
            short,
            long,
            budget,
            counter: 0,
        }
    }

    #[must_use]
    pub fn from_config(config: &PollConfig) -> Self {
        Self::new(
            Duration::from_millis(config.short_interval_ms),
            Duration::from_millis(config.long_interval_ms),
            config.short_interval_budget,
        )
    }

    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Record a successful cycle and return the delay before the next one.
    pub fn after_cycle(&mut self, activity: bool) -> Duration {
        if activity {
            self.counter = self.budget;
        } else {
            self.counter = self.counter.saturating_sub(1);
        }
        self.current_delay()
    }

    /// Record a failed cycle. The next attempt always waits the long interval.
    pub fn after_failure(&mut self) -> Duration {
        self.counter = self.counter.saturating_sub(1);
        self.long
    }

    #[must_use]
    pub fn current_delay(&self) -> Duration {
        if self.counter > 0 { self.short } else { self.long }
    }
}

/// Run one cycle, swallowing its error, and return the next delay.
pub async fn poll_once<B: BackendApi, O: UiObserver>(
    session: &ChatSession<'_, B, O>,
    cadence: &mut PollCadence,
) -> Duration {
    match session.reconcile().await {
        Ok(outcome) => cadence.after_cycle(outcome.activity),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "poll cycle failed");
            cadence.after_failure()
        }
    }
}

/// Poll until `shutdown` resolves. Returns the number of cycles run.
pub async fn run_poll_loop<B: BackendApi, O: UiObserver>(
    session: &ChatSession<'_, B, O>,
    cadence: &mut PollCadence,
    shutdown: impl Future<Output = ()>,
) -> u64 {
    tokio::pin!(shutdown);
    let mut cycles = 0;
    loop {
        let delay = tokio::select! {
            () = &mut shutdown => return cycles,
            delay = poll_once(session, cadence) => delay,
        };
        cycles += 1;
        tokio::select! {
            () = &mut shutdown => return cycles,
            () = tokio::time::sleep(delay) => {}
        }
    }
}
