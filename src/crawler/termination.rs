//! Pending-task accounting and termination detection
//!
//! The crawl has no known size up front: workers create tasks while they
//! consume others. Termination is decided by a single detector task that
//! owns the running total of outstanding tasks and is fed signed deltas over
//! a channel.
//!
//! Ordering rules that make the protocol sound:
//!
//! - a producer sends `+1` *before* the task is enqueued
//! - a worker sends `-1` only *after* every child of its task was counted
//!
//! With both rules the total can only reach zero once no task is queued or
//! in flight. Reaching zero after having been positive raises the shutdown
//! signal.

use crate::crawler::progress::CrawlProgress;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};

/// Handle used by producers and workers to report task creation/completion
#[derive(Debug, Clone)]
pub struct PendingCounter {
    deltas: mpsc::UnboundedSender<i64>,
    progress: Arc<CrawlProgress>,
}

impl PendingCounter {
    /// Records a new task; must be called before the task is enqueued
    pub fn task_created(&self) {
        self.progress.record_created();
        // The detector only stops listening once the crawl is over
        let _ = self.deltas.send(1);
    }

    /// Records a finished task
    pub fn task_finished(&self) {
        self.progress.record_finished();
        let _ = self.deltas.send(-1);
    }

    /// Returns a guard that records the task as finished when dropped
    ///
    /// Workers take the guard as soon as they dequeue a task, so every exit
    /// path of a handler (including a panic) finishes the task exactly once.
    pub fn finish_on_drop(&self) -> TaskGuard<'_> {
        TaskGuard { counter: self }
    }
}

/// Finishes one task when dropped
#[must_use = "the task is finished as soon as the guard is dropped"]
#[derive(Debug)]
pub struct TaskGuard<'a> {
    counter: &'a PendingCounter,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.counter.task_finished();
    }
}

/// Receiving side of the shutdown signal
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Returns true once shutdown was raised
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Waits until shutdown is raised (or the detector is gone)
    pub async fn triggered(&mut self) {
        let _ = self.receiver.wait_for(|done| *done).await;
    }
}

/// Counts observed by the detector over the whole crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminationSummary {
    /// Tasks created, seeds included
    pub created: u64,

    /// Tasks finished
    pub finished: u64,

    /// Highest number of outstanding tasks at any point
    pub peak: u64,

    /// True if the crawl ended on an external stop request
    pub stopped: bool,
}

/// Lifecycle of the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// No task was ever outstanding
    Waiting,
    /// At least one task has been outstanding
    Active,
    /// The total returned to zero after being positive
    Done,
}

/// Single owner of the running pending total
#[derive(Debug)]
pub struct TerminationDetector {
    deltas: mpsc::UnboundedReceiver<i64>,
    shutdown: watch::Sender<bool>,
    state: DetectorState,
    total: i64,
    created: u64,
    finished: u64,
    peak: u64,
}

/// Creates the pending counter, its detector, and the shutdown signal
///
/// `initial` is the number of tasks that exist before any worker starts
/// (the seeds); they are counted up front so that a fast worker cannot
/// drive the total to zero while seeds are still being enqueued.
pub fn pending_channel(
    initial: usize,
    progress: Arc<CrawlProgress>,
) -> (PendingCounter, TerminationDetector, ShutdownSignal) {
    let (delta_tx, delta_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    progress.record_created_n(initial as u64);

    let counter = PendingCounter {
        deltas: delta_tx,
        progress,
    };
    let detector = TerminationDetector {
        deltas: delta_rx,
        shutdown: shutdown_tx,
        state: if initial > 0 {
            DetectorState::Active
        } else {
            DetectorState::Waiting
        },
        total: initial as i64,
        created: initial as u64,
        finished: 0,
        peak: initial as u64,
    };
    let signal = ShutdownSignal {
        receiver: shutdown_rx,
    };

    (counter, detector, signal)
}

impl TerminationDetector {
    /// Current lifecycle state
    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Current number of outstanding tasks
    pub fn pending(&self) -> i64 {
        self.total
    }

    /// Applies one delta and returns the resulting state
    pub fn apply(&mut self, delta: i64) -> DetectorState {
        if delta >= 0 {
            self.created += delta as u64;
        } else {
            self.finished += delta.unsigned_abs();
        }
        self.total += delta;

        if self.total < 0 {
            tracing::error!(
                "Pending task count went negative ({}): a task finished more than once",
                self.total
            );
            debug_assert!(self.total >= 0, "pending task count went negative");
        }

        if self.total > 0 {
            self.peak = self.peak.max(self.total as u64);
            self.state = DetectorState::Active;
        } else if self.total == 0 && self.state == DetectorState::Active {
            self.state = DetectorState::Done;
        }

        self.state
    }

    /// Runs until the total drains to zero or a stop is requested
    ///
    /// Raises the shutdown signal before returning, in every case.
    pub async fn run(mut self, stop: Arc<Notify>) -> TerminationSummary {
        tracing::debug!("Termination detector spawned with {} pending", self.total);

        let mut stopped = false;
        while self.state != DetectorState::Done {
            tokio::select! {
                biased;
                _ = stop.notified() => {
                    tracing::info!("Stop requested with {} tasks pending", self.total);
                    stopped = true;
                    break;
                }
                delta = self.deltas.recv() => match delta {
                    Some(delta) => {
                        self.apply(delta);
                    }
                    None => {
                        tracing::warn!("All task producers gone with {} pending", self.total);
                        break;
                    }
                },
            }
        }

        let _ = self.shutdown.send(true);
        tracing::debug!(
            "Termination detector exit: created {}, finished {}",
            self.created,
            self.finished
        );

        TerminationSummary {
            created: self.created,
            finished: self.finished,
            peak: self.peak,
            stopped,
        }
    }
}
