//! Live crawl counters and the periodic progress reporter
//!
//! Nothing in here takes part in deciding when the crawl is over; the
//! counters are a best-effort view for logging.

use crate::crawler::task::TaskQueue;
use crate::crawler::termination::ShutdownSignal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Default period between progress lines
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Finished/total task counters shared by all workers
#[derive(Debug, Default)]
pub struct CrawlProgress {
    total: AtomicU64,
    finished: AtomicU64,
}

impl CrawlProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_created_n(&self, n: u64) {
        self.total.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_finished(&self) {
        self.finished.fetch_add(1, Ordering::Relaxed);
    }

    /// Tasks created so far
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Tasks finished so far
    pub fn finished(&self) -> u64 {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Periodically logs `finished/total` and the queue depth
pub struct ProgressMonitor {
    progress: std::sync::Arc<CrawlProgress>,
    queue: TaskQueue,
    shutdown: ShutdownSignal,
    period: Duration,
}

impl ProgressMonitor {
    pub fn new(
        progress: std::sync::Arc<CrawlProgress>,
        queue: TaskQueue,
        shutdown: ShutdownSignal,
        period: Duration,
    ) -> Self {
        Self {
            progress,
            queue,
            shutdown,
            period,
        }
    }

    /// Reports until shutdown is raised
    pub async fn run(mut self) {
        tracing::debug!("Progress monitor spawned");

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.shutdown.triggered() => break,
                _ = ticker.tick() => {
                    tracing::debug!(
                        "Progress {}/{}. Queued {}",
                        self.progress.finished(),
                        self.progress.total(),
                        self.queue.len()
                    );
                }
            }
        }

        tracing::debug!(
            "Progress monitor exit at {}/{}",
            self.progress.finished(),
            self.progress.total()
        );
    }
}
