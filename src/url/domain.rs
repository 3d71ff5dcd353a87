//! Host extraction
//!
//! Hosts are compared lowercased and without port, so `http://A.com:8080/`
//! and `https://a.com/` share a throttle slot and count as the same host.

use crate::UrlError;
use url::Url;

/// Returns the lowercased host of a URL, or None for host-less URLs
///
/// ```
/// use linkwave::url::extract_domain;
/// use url::Url;
///
/// let url = Url::parse("https://Sub.EXAMPLE.com:8443/path").unwrap();
/// assert_eq!(extract_domain(&url).as_deref(), Some("sub.example.com"));
///
/// let url = Url::parse("mailto:someone@example.com").unwrap();
/// assert_eq!(extract_domain(&url), None);
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_lowercase)
}

/// Parses an absolute URL string and returns its lowercased host
///
/// Used by the pruners, which receive raw link strings.
///
/// ```
/// use linkwave::url::host_of;
///
/// assert_eq!(host_of("https://Blog.Example.com/a").unwrap(), "blog.example.com");
/// assert!(host_of("example.com/no-scheme").is_err());
/// ```
pub fn host_of(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;
    extract_domain(&url).ok_or(UrlError::MissingDomain)
}

/// Returns whether two URLs point at the same host
pub fn is_same_host(a: &str, b: &str) -> Result<bool, UrlError> {
    Ok(host_of(a)? == host_of(b)?)
}
