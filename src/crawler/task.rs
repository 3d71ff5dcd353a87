//! Tasks and the queue that carries them between workers
//!
//! The queue is a bounded `tokio` mpsc channel with a very large capacity so
//! that producers (workers that discover links) practically never wait on
//! it. All workers share the single receiver behind an async mutex.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Capacity of the task queue, sized for full breadth-first fan-out
pub const TASK_QUEUE_CAPACITY: usize = 4_000_000;

/// Capacity of the result and error channels
pub const CHANNEL_DEFAULT_SIZE: usize = 100;

/// A discovered link and, once fetched, the page details attached to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Depth of the page on which the link was found
    pub depth: u32,

    /// Absolute URL of the link target
    pub url: String,

    /// Anchor text
    pub text: String,

    /// Title of the target page, if it was fetched and had one
    pub title: Option<String>,

    /// Visible text of the target page, if it was fetched and extracted
    pub content: Option<String>,
}

impl Link {
    /// Creates a link with no page details yet
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            depth: 0,
            url: url.into(),
            text: text.into(),
            title: None,
            content: None,
        }
    }
}

/// A unit of work for the worker pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Fetch a page and follow its outbound links
    CrawlPage { url: String, depth: u32 },

    /// Fetch a discovered page's title and content and emit it
    FetchPageDetail { link: Link },
}

impl Task {
    /// The URL this task will fetch
    pub fn url(&self) -> &str {
        match self {
            Task::CrawlPage { url, .. } => url,
            Task::FetchPageDetail { link } => &link.url,
        }
    }
}

/// Producer/consumer handles for the task queue
///
/// Cloning is cheap; every clone feeds and drains the same queue.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    sender: mpsc::Sender<Task>,
    receiver: Arc<Mutex<mpsc::Receiver<Task>>>,
}

impl TaskQueue {
    /// Creates a queue with the default (very large) capacity
    pub fn new() -> Self {
        Self::with_capacity(TASK_QUEUE_CAPACITY)
    }

    /// Creates a queue with an explicit capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Enqueues a task, waiting only if the queue is full
    pub async fn push(&self, task: Task) -> Result<(), mpsc::error::SendError<Task>> {
        self.sender.send(task).await
    }

    /// Takes the next task, waiting until one is available
    ///
    /// Only one worker at a time waits on the channel itself; the others wait
    /// on the mutex. Cancelling this future releases the mutex.
    pub async fn pop(&self) -> Option<Task> {
        self.receiver.lock().await.recv().await
    }

    /// Number of tasks currently waiting in the queue
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Returns true if no task is waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
