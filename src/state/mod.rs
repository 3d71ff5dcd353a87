//! State module for tracking per-host crawl pacing
//!
//! # Components
//!
//! - `HostState`: request count and next permitted request time for one host

mod host_state;

pub use host_state::HostState;
