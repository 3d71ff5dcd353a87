//! Linkwave: a polite breadth-first link crawler
//!
//! This crate crawls outward from seed URLs with a pool of concurrent workers,
//! deduplicating visited pages, spacing requests per host, and emitting one
//! CSV record per discovered page.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Linkwave operations
#[derive(Debug, Error)]
pub enum LinkwaveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to write output header: {0}")]
    Output(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkwaveError {
    /// Returns true for errors caused by bad user input (config file, seeds)
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::UrlError(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Per-page errors
///
/// These never abort a crawl. Workers forward them to the error sink and
/// still mark their task as finished.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Failed to GET url {url}, error {source}")]
    Fetch { url: String, source: reqwest::Error },

    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Cannot join {base} with {href}: {message}")]
    Join {
        base: String,
        href: String,
        message: String,
    },

    #[error("Did not find title in {url}")]
    MissingTitle { url: String },

    #[error("Cannot determine host of {url}")]
    MissingHost { url: String },

    #[error("Pruner rejected {child} (from {parent}): {message}")]
    Prune {
        parent: String,
        child: String,
        message: String,
    },
}

/// Result type alias for Linkwave operations
pub type Result<T> = std::result::Result<T, LinkwaveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for per-page operations
pub type PageResult<T> = std::result::Result<T, PageError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlSettings, Crawler, StopHandle};
pub use output::CrawlReport;
pub use crate::url::{extract_domain, normalize_url};
