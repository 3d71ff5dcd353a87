//! Per-host request pacing
//!
//! Each host has a `HostState` holding the earliest start time of its next
//! request. A worker reserves a slot under the map lock and then sleeps
//! outside of it, so workers hitting different hosts never wait on each
//! other and workers hitting the same host are spaced by the interval.

use crate::config::ThrottlePolicy;
use crate::state::HostState;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Spaces requests to the same host by a minimum interval
#[derive(Debug)]
pub struct HostThrottler {
    interval: Duration,
    policy: ThrottlePolicy,
    seed_hosts: HashSet<String>,
    hosts: Mutex<HashMap<String, HostState>>,
}

impl HostThrottler {
    /// Creates a throttler
    ///
    /// `seed_hosts` only matters for `ThrottlePolicy::SeedHosts`, where it is
    /// the complete set of hosts that get throttled.
    pub fn new<I>(interval: Duration, policy: ThrottlePolicy, seed_hosts: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            interval,
            policy,
            seed_hosts: seed_hosts.into_iter().collect(),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// A throttler that never delays
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, ThrottlePolicy::AllHosts, Vec::new())
    }

    /// Returns whether requests to this host are paced at all
    pub fn applies_to(&self, host: &str) -> bool {
        if self.interval.is_zero() {
            return false;
        }
        match self.policy {
            ThrottlePolicy::AllHosts => true,
            ThrottlePolicy::SeedHosts => self.seed_hosts.contains(host),
        }
    }

    /// Reserves the next request slot for a host without waiting
    ///
    /// Returns the instant the request may start, or None if the host is
    /// not throttled.
    pub fn reserve(&self, host: &str) -> Option<Instant> {
        if !self.applies_to(host) {
            return None;
        }

        let now = Instant::now();
        let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = hosts
            .entry(host.to_string())
            .or_insert_with(HostState::new)
            .reserve(now, self.interval);

        tracing::trace!("Host {} slot in {:?}", host, slot.saturating_duration_since(now));
        Some(slot)
    }

    /// Waits until a request to `host` is permitted
    pub async fn acquire(&self, host: &str) {
        if let Some(slot) = self.reserve(host) {
            tokio::time::sleep_until(slot).await;
        }
    }

    /// Number of hosts that have been throttled so far
    pub fn host_count(&self) -> usize {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Requests granted to a host so far
    pub fn request_count(&self, host: &str) -> u64 {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host)
            .map_or(0, |state| state.request_count)
    }
}
