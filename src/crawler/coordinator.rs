//! Crawler coordinator - main crawl orchestration logic
//!
//! `Crawler::crawl` wires one crawl together:
//! - validating seeds and writing the CSV header
//! - creating the task queue, pending counter, and result channels
//! - spawning the worker pool, termination detector, and progress monitor
//! - draining results on the calling task until the pool has exited
//! - joining everything into a `CrawlReport`

use crate::config::{Config, CrawlerConfig, ThrottlePolicy};
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::progress::{CrawlProgress, ProgressMonitor, PROGRESS_INTERVAL};
use crate::crawler::pruner::{pruner_from_config, AllowAll, Pruner};
use crate::crawler::task::{Task, TaskQueue, CHANNEL_DEFAULT_SIZE};
use crate::crawler::termination::{pending_channel, TerminationSummary};
use crate::crawler::throttle::HostThrottler;
use crate::crawler::visited::VisitedSet;
use crate::crawler::worker::{Worker, WorkerContext};
use crate::output::{CrawlReport, ResultEmitter};
use crate::url::{extract_domain, parse_seed};
use crate::LinkwaveError;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinSet;
use url::Url;

/// Crawl limits and pacing, independent of any transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    /// Crawl tasks are only created for depths strictly below this value
    pub max_depth: u32,

    /// Links followed per page (0 = unlimited)
    pub max_breadth: usize,

    /// Size of the worker pool
    pub workers: usize,

    /// Minimum spacing between requests to one host
    pub request_interval: Duration,

    pub throttle_policy: ThrottlePolicy,

    /// Fill the `Content` column with the page text
    pub include_content: bool,
}

impl CrawlSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_breadth: config.max_breadth,
            workers: config.workers.max(1),
            request_interval: Duration::from_millis(config.request_interval_ms),
            throttle_policy: config.throttle_policy,
            include_content: config.include_content,
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Stop signal of the crawl currently running on a `Crawler`, if any
#[derive(Debug, Default)]
struct StopSlot {
    active: Mutex<Option<Arc<Notify>>>,
}

impl StopSlot {
    /// Registers a crawl's stop signal until the returned guard drops
    fn begin(&self, notify: Arc<Notify>) -> ActiveCrawl<'_> {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&notify));
        ActiveCrawl { slot: self, notify }
    }

    fn stop(&self) -> bool {
        match &*self.active.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(notify) => {
                notify.notify_one();
                true
            }
            None => false,
        }
    }
}

/// Clears the slot when the crawl ends, however it ends
struct ActiveCrawl<'a> {
    slot: &'a StopSlot,
    notify: Arc<Notify>,
}

impl Drop for ActiveCrawl<'_> {
    fn drop(&mut self) {
        let mut active = self.slot.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &self.notify))
        {
            *active = None;
        }
    }
}

/// Requests a running crawl to stop
///
/// Workers finish the task in hand and stop pulling new ones; the crawl
/// then returns a report with `stopped` set. A stop only reaches the crawl
/// running at the time of the call: while no crawl is running it is
/// ignored, so a late stop never leaks into the next crawl.
#[derive(Debug, Clone)]
pub struct StopHandle {
    slot: Arc<StopSlot>,
}

impl StopHandle {
    /// Returns false if no crawl was running
    pub fn stop(&self) -> bool {
        self.slot.stop()
    }
}

/// Entry point for running crawls
pub struct Crawler {
    settings: CrawlSettings,
    fetcher: Arc<dyn Fetcher>,
    pruner: Arc<dyn Pruner>,
    stop: Arc<StopSlot>,
    progress_interval: Duration,
}

impl Crawler {
    /// Creates a crawler that follows every link
    pub fn new(settings: CrawlSettings, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            settings,
            fetcher,
            pruner: Arc::new(AllowAll),
            stop: Arc::new(StopSlot::default()),
            progress_interval: PROGRESS_INTERVAL,
        }
    }

    /// Creates an HTTP crawler with the pruner the configuration describes
    pub fn from_config(config: &Config) -> Result<Self, LinkwaveError> {
        let fetcher = HttpFetcher::from_config(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;

        Ok(
            Self::new(CrawlSettings::from_config(&config.crawler), Arc::new(fetcher))
                .with_pruner(pruner_from_config(&config.crawler)),
        )
    }

    pub fn with_pruner(mut self, pruner: Arc<dyn Pruner>) -> Self {
        self.pruner = pruner;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            slot: Arc::clone(&self.stop),
        }
    }

    /// Crawls outward from `seeds`, writing CSV records to `output` and
    /// error lines to `errors`
    ///
    /// # Errors
    ///
    /// Fails before any page is fetched if a seed is not an absolute
    /// http(s) URL, or if the CSV header cannot be written. Everything that
    /// goes wrong later is per-page and ends up on the error sink.
    pub async fn crawl<W: Write, E: Write>(
        &self,
        seeds: &[String],
        output: W,
        errors: E,
    ) -> Result<CrawlReport, LinkwaveError> {
        let start_time = Instant::now();

        let seeds = seeds
            .iter()
            .map(|s| parse_seed(s))
            .collect::<Result<Vec<Url>, _>>()?;

        let mut emitter = ResultEmitter::new(output, errors);
        emitter.write_header()?;

        if seeds.is_empty() {
            tracing::info!("No seeds given, nothing to crawl");
            return Ok(CrawlReport {
                elapsed: start_time.elapsed(),
                ..Default::default()
            });
        }

        tracing::info!(
            "Starting crawl of {} seeds with {} workers (depth {}, breadth {})",
            seeds.len(),
            self.settings.workers,
            self.settings.max_depth,
            self.settings.max_breadth
        );

        let stop = Arc::new(Notify::new());
        let _active = self.stop.begin(Arc::clone(&stop));

        let progress = Arc::new(CrawlProgress::new());
        let (pending, detector, shutdown) = pending_channel(seeds.len(), progress.clone());
        let queue = TaskQueue::new();

        for seed in &seeds {
            let task = Task::CrawlPage {
                url: seed.to_string(),
                depth: 0,
            };
            if queue.push(task).await.is_err() {
                tracing::error!("Task queue closed while seeding {}", seed);
                pending.task_finished();
            }
        }

        let throttler = HostThrottler::new(
            self.settings.request_interval,
            self.settings.throttle_policy,
            seeds.iter().filter_map(extract_domain),
        );

        let ctx = Arc::new(WorkerContext {
            settings: self.settings.clone(),
            fetcher: Arc::clone(&self.fetcher),
            pruner: Arc::clone(&self.pruner),
            visited: VisitedSet::new(),
            throttler,
            pending,
            queue: queue.clone(),
        });

        let (links_tx, links_rx) = mpsc::channel(CHANNEL_DEFAULT_SIZE);
        let (errors_tx, errors_rx) = mpsc::channel(CHANNEL_DEFAULT_SIZE);

        let mut workers = JoinSet::new();
        for id in 0..self.settings.workers {
            let worker = Worker::new(
                id,
                Arc::clone(&ctx),
                links_tx.clone(),
                errors_tx.clone(),
                shutdown.clone(),
            );
            workers.spawn(worker.run());
        }
        // The channels close once the last worker drops its senders
        drop(links_tx);
        drop(errors_tx);

        let detector_handle = tokio::spawn(detector.run(Arc::clone(&stop)));
        let monitor = ProgressMonitor::new(
            progress.clone(),
            queue,
            shutdown.clone(),
            self.progress_interval,
        );
        let monitor_handle = tokio::spawn(monitor.run());

        let counts = emitter.drain(links_rx, errors_rx).await;

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        if !shutdown.is_triggered() {
            // Every worker died before the crawl drained
            tracing::error!("Worker pool exited early, stopping crawl");
            stop.notify_one();
        }

        let summary = detector_handle.await.unwrap_or_else(|e| {
            tracing::error!("Termination detector failed: {}", e);
            TerminationSummary {
                stopped: true,
                ..Default::default()
            }
        });
        if let Err(e) = monitor_handle.await {
            tracing::warn!("Progress monitor failed: {}", e);
        }

        Ok(CrawlReport {
            records_emitted: counts.records,
            errors_reported: counts.errors,
            tasks_created: progress.total(),
            tasks_finished: progress.finished(),
            peak_pending: summary.peak,
            urls_visited: ctx.visited.len(),
            elapsed: start_time.elapsed(),
            stopped: summary.stopped,
        })
    }
}
