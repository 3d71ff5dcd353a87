//! Content-addressed set of URLs admitted to the crawl
//!
//! Keys are SHA-256 digests of the normalized URL, so every entry has the
//! same small size regardless of URL length. Digest collisions are accepted
//! as a theoretical risk.

use crate::url::dedup_key;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

type UrlDigest = [u8; 32];

/// Concurrent set of visited URLs
///
/// Reads (`contains`) may run in parallel; inserts are serialized by the
/// internal write lock.
#[derive(Debug, Default)]
pub struct VisitedSet {
    keys: RwLock<HashSet<UrlDigest>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn digest(url: &str) -> UrlDigest {
        Sha256::digest(dedup_key(url).as_bytes()).into()
    }

    /// Returns true if the URL was already admitted
    pub fn contains(&self, url: &str) -> bool {
        let key = Self::digest(url);
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
    }

    /// Admits a URL, returning true iff it was not present before
    ///
    /// Test and insert happen under one write lock, so when several workers
    /// race on the same URL exactly one of them gets `true`.
    pub fn insert(&self, url: &str) -> bool {
        let key = Self::digest(url);
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    /// Number of distinct URLs admitted
    pub fn len(&self) -> usize {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
