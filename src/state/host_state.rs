use std::time::Duration;
use tokio::time::Instant;

/// Tracks the request pacing of one host during a crawl
///
/// The throttler keeps one of these per host. Instead of a ticking timer the
/// state stores the earliest instant at which the next request may start,
/// so an idle host costs nothing but this struct.
#[derive(Debug, Clone)]
pub struct HostState {
    /// Number of requests granted to this host so far
    pub request_count: u64,

    /// Earliest start time for the next request
    pub next_permitted: Option<Instant>,
}

impl HostState {
    /// Creates a new HostState with no request history
    pub fn new() -> Self {
        Self {
            request_count: 0,
            next_permitted: None,
        }
    }

    /// Reserves the next request slot for this host
    ///
    /// Returns the instant at which the caller may start its request: `now`
    /// if the host is idle, otherwise the previously reserved slot plus the
    /// interval. The slot after it is pushed back by `interval`, so
    /// concurrent callers are granted distinct, evenly spaced slots.
    pub fn reserve(&mut self, now: Instant, interval: Duration) -> Instant {
        let slot = match self.next_permitted {
            Some(next) if next > now => next,
            _ => now,
        };

        self.request_count += 1;
        self.next_permitted = Some(slot + interval);

        slot
    }
}

impl Default for HostState {
    fn default() -> Self {
        Self::new()
    }
}
