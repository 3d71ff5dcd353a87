//! Link pruning policies
//!
//! A pruner decides whether a link discovered on a parent page is eligible
//! to be followed. Policies are injected into the crawler as trait objects.

use crate::config::CrawlerConfig;
use crate::url::{host_of, matches_any};
use crate::PageError;
use std::sync::Arc;

/// Decides whether a discovered link should be kept
pub trait Pruner: Send + Sync {
    /// Returns Ok(true) to keep the `child` link found on `parent`
    ///
    /// An error drops the link and is reported on the error sink.
    fn should_keep(&self, parent: &str, child: &str) -> Result<bool, PageError>;
}

/// Keeps every link
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Pruner for AllowAll {
    fn should_keep(&self, _parent: &str, _child: &str) -> Result<bool, PageError> {
        Ok(true)
    }
}

/// Keeps links whose host equals the parent page's host
#[derive(Debug, Clone, Copy, Default)]
pub struct SameHost;

impl Pruner for SameHost {
    fn should_keep(&self, parent: &str, child: &str) -> Result<bool, PageError> {
        let parent_host = host_of(parent).map_err(|e| prune_error(parent, child, e))?;
        let child_host = host_of(child).map_err(|e| prune_error(parent, child, e))?;
        Ok(parent_host == child_host)
    }
}

/// Keeps links whose host matches one of a list of wildcard patterns
#[derive(Debug, Clone, Default)]
pub struct HostPattern {
    patterns: Vec<String>,
}

impl HostPattern {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }
}

impl Pruner for HostPattern {
    fn should_keep(&self, parent: &str, child: &str) -> Result<bool, PageError> {
        let child_host = host_of(child).map_err(|e| prune_error(parent, child, e))?;
        Ok(matches_any(&self.patterns, &child_host))
    }
}

fn prune_error(parent: &str, child: &str, err: crate::UrlError) -> PageError {
    PageError::Prune {
        parent: parent.to_string(),
        child: child.to_string(),
        message: err.to_string(),
    }
}

/// Picks the pruner described by the crawler configuration
pub fn pruner_from_config(config: &CrawlerConfig) -> Arc<dyn Pruner> {
    if config.same_host {
        Arc::new(SameHost)
    } else if !config.allowed_hosts.is_empty() {
        Arc::new(HostPattern::new(&config.allowed_hosts))
    } else {
        Arc::new(AllowAll)
    }
}
