// Periodic driver for the drain loop
//
// Ticks never overlap: the next tick is only awaited once the current drain
// has returned, and missed ticks are delayed rather than bursted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::{BatchProcessor, DrainReport};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

pub struct DrainScheduler {
    processor: Arc<BatchProcessor>,
    interval: Duration,
}

impl DrainScheduler {
    pub fn new(processor: Arc<BatchProcessor>) -> Self {
        Self {
            processor,
            interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start ticking on the current tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown, signal) = watch::channel(false);
        let task = tokio::spawn(run(self.processor, self.interval, signal));
        SchedulerHandle { shutdown, task }
    }
}

/// Stops a spawned [`DrainScheduler`].
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<DrainReport>,
}

impl SchedulerHandle {
    /// Stop ticking, drain whatever is still queued and return what that
    /// final drain did.
    pub async fn shutdown(self) -> DrainReport {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Drain scheduler task failed");
                DrainReport::default()
            }
        }
    }
}

async fn run(
    processor: Arc<BatchProcessor>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> DrainReport {
    debug!(
        "Drain scheduler started (interval={}ms)",
        interval.as_millis()
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let processor = processor.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || processor.drain()).await {
                    error!(error = %e, "Drain tick panicked");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    let final_drain = {
        let processor = processor.clone();
        tokio::task::spawn_blocking(move || processor.drain_all()).await
    };
    let report = match final_drain {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Final drain panicked");
            DrainReport::default()
        }
    };

    if !report.is_empty() {
        info!(
            batches = report.batches,
            records_stored = report.records_stored,
            "Drained pending batches before shutdown"
        );
    }
    debug!("Drain scheduler stopped");

    report
}
