use std::sync::Arc;
use std::time;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::alert_cycle::AlertCycle;

/// Background task running the alert cycle on a fixed period
pub struct AlertWorker {
    cycle: Arc<AlertCycle>,
    period: time::Duration,
}

impl AlertWorker {
    pub const fn new(cycle: Arc<AlertCycle>, period: time::Duration) -> Self {
        Self { cycle, period }
    }

    /// Run a cycle every period until `shutdown` flips or its sender is dropped.
    /// A cycle already in flight is allowed to finish before returning.
    pub async fn run_until_stopped(self, mut shutdown: watch::Receiver<bool>) {
        // The first check happens one full period after startup
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(period_secs = self.period.as_secs(), "Alert worker started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    self.cycle.run().await;
                }
            }
        }

        tracing::info!("Alert worker stopped");
    }
}
