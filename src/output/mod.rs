//! Output module for crawl records, errors, and the final report
//!
//! This module handles:
//! - Writing discovered links as CSV records
//! - Writing per-page errors to the error sink
//! - Summarizing a crawl in a `CrawlReport`

mod emitter;
pub mod stats;

pub use emitter::{EmitterCounts, ResultEmitter, CSV_HEADER};
pub use stats::{log_report, CrawlReport};
