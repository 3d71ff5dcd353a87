//! Crawl summary
//!
//! A `CrawlReport` is assembled by the coordinator once the pool is joined
//! and handed back to the caller of `Crawler::crawl`.

use std::time::Duration;

/// Counters describing a finished (or stopped) crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// CSV records written to the output sink
    pub records_emitted: u64,

    /// Per-page errors written to the error sink
    pub errors_reported: u64,

    /// Tasks created, seeds included
    pub tasks_created: u64,

    /// Tasks finished
    pub tasks_finished: u64,

    /// Highest number of outstanding tasks at any point
    pub peak_pending: u64,

    /// Distinct URLs admitted to the visited set
    pub urls_visited: usize,

    /// Wall time of the crawl
    pub elapsed: Duration,

    /// True if the crawl ended on a stop request rather than by draining
    pub stopped: bool,
}

impl CrawlReport {
    /// Tasks that were created but never ran (only non-zero after a stop)
    pub fn tasks_abandoned(&self) -> u64 {
        self.tasks_created.saturating_sub(self.tasks_finished)
    }

    /// Records written per second of wall time
    pub fn records_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.records_emitted as f64 / secs
        } else {
            0.0
        }
    }
}

/// Logs the report at info level
pub fn log_report(report: &CrawlReport) {
    let outcome = if report.stopped { "stopped" } else { "completed" };

    tracing::info!(
        "Crawl {} in {:.2?}: {} records, {} errors, {} urls visited ({:.2} records/sec)",
        outcome,
        report.elapsed,
        report.records_emitted,
        report.errors_reported,
        report.urls_visited,
        report.records_per_sec()
    );
    tracing::info!(
        "Tasks: {} created, {} finished, peak {} pending",
        report.tasks_created,
        report.tasks_finished,
        report.peak_pending
    );

    if report.tasks_abandoned() > 0 {
        tracing::warn!("{} queued tasks were abandoned", report.tasks_abandoned());
    }
}
