//! URL handling module for Linkwave
//!
//! This module provides URL normalization, host extraction, and wildcard
//! host matching. Everything here is a pure function of its input.

mod domain;
mod matcher;
mod normalize;

use crate::UrlError;
use ::url::Url;

// Re-export main functions
pub use domain::{extract_domain, host_of, is_same_host};
pub use matcher::{matches_any, matches_wildcard};
pub use normalize::normalize_url;

/// Parses a seed URL supplied by the user
///
/// Seeds must be absolute http(s) URLs with a host. Anything else is a
/// configuration error and aborts the crawl before any worker starts.
///
/// # Examples
///
/// ```
/// use linkwave::url::parse_seed;
///
/// assert!(parse_seed("https://example.com/").is_ok());
/// assert!(parse_seed("example.com").is_err());
/// assert!(parse_seed("ftp://example.com/").is_err());
/// ```
pub fn parse_seed(seed: &str) -> Result<Url, UrlError> {
    let url = Url::parse(seed.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Seed '{}' must use http or https",
            seed
        )));
    }

    if extract_domain(&url).is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Computes the visited-set key for a URL
///
/// Falls back to the raw string when the URL cannot be normalized, so that
/// even odd links are deduplicated by exact text.
pub fn dedup_key(url: &str) -> String {
    normalize_url(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}
