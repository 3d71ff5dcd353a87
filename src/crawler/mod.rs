//! Crawler module for concurrent link discovery
//!
//! This module contains the core crawling logic, including:
//! - The task queue and the worker pool that drains it
//! - Termination detection for a queue that grows while it is consumed
//! - Per-host request throttling and the visited-URL set
//! - HTTP fetching, HTML parsing, and link pruning
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod progress;
mod pruner;
mod task;
mod termination;
mod throttle;
mod visited;
mod worker;

pub use coordinator::{CrawlSettings, Crawler, StopHandle};
pub use fetcher::{build_http_client, Fetcher, HttpFetcher};
pub use parser::{parse_links, parse_page, parse_title, ParsedPage};
pub use progress::{CrawlProgress, ProgressMonitor, PROGRESS_INTERVAL};
pub use pruner::{pruner_from_config, AllowAll, HostPattern, Pruner, SameHost};
pub use task::{Link, Task, TaskQueue, CHANNEL_DEFAULT_SIZE, TASK_QUEUE_CAPACITY};
pub use termination::{
    pending_channel, DetectorState, PendingCounter, ShutdownSignal, TaskGuard,
    TerminationDetector, TerminationSummary,
};
pub use throttle::HostThrottler;
pub use visited::VisitedSet;
