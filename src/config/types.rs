use serde::Deserialize;

/// Main configuration structure for Linkwave
///
/// Every section and field has a default, so an empty file (or no file at
/// all) is a valid configuration once seeds are supplied on the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed URLs, crawled at depth 0
    pub seeds: Vec<String>,

    pub crawler: CrawlerConfig,

    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,

    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Crawl tasks are only created for depths strictly below this value
    pub max_depth: u32,

    /// Maximum links followed per page (0 = unlimited)
    pub max_breadth: usize,

    /// Number of concurrent workers
    pub workers: usize,

    /// Minimum time between requests to the same host (milliseconds)
    pub request_interval_ms: u64,

    /// Only follow links that stay on the parent page's host
    pub same_host: bool,

    /// Only follow links whose host matches one of these patterns
    pub allowed_hosts: Vec<String>,

    /// Which hosts the throttler applies to
    pub throttle_policy: ThrottlePolicy,

    /// Extract page body text into the `Content` column
    pub include_content: bool,

    /// Whole-request timeout for the HTTP client (seconds)
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_breadth: 0,
            workers: 8,
            request_interval_ms: 1000,
            same_host: false,
            allowed_hosts: Vec::new(),
            throttle_policy: ThrottlePolicy::default(),
            include_content: true,
            request_timeout_secs: 30,
        }
    }
}

/// Policy for hosts that were not seen among the seeds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThrottlePolicy {
    /// Every host gets its own throttle entry, created on first request
    #[default]
    AllHosts,

    /// Only seed hosts are throttled; any other host is fetched immediately
    SeedHosts,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler (optional)
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "linkwave".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: String::new(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// `Name/Version`, or `Name/Version (+ContactURL)` when a contact URL is set.
    pub fn header_value(&self) -> String {
        if self.contact_url.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, self.contact_url
            )
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// CSV record destination; empty means standard output
    pub output_path: String,

    /// Error line destination; empty means standard error
    pub error_path: String,
}
