//! Worker pool task handlers
//!
//! A worker pulls tasks until the shutdown signal is raised. Each task is
//! finished through a `TaskGuard` taken right after it is dequeued, so the
//! pending count drops exactly once per task, after every child task the
//! handler created has been counted.

use crate::crawler::coordinator::CrawlSettings;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{parse_links, parse_page};
use crate::crawler::pruner::Pruner;
use crate::crawler::task::{Link, Task, TaskQueue};
use crate::crawler::termination::{PendingCounter, ShutdownSignal};
use crate::crawler::throttle::HostThrottler;
use crate::crawler::visited::VisitedSet;
use crate::url::extract_domain;
use crate::PageError;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// State shared by every worker of one crawl
pub(crate) struct WorkerContext {
    pub settings: CrawlSettings,
    pub fetcher: Arc<dyn Fetcher>,
    pub pruner: Arc<dyn Pruner>,
    pub visited: VisitedSet,
    pub throttler: HostThrottler,
    pub pending: PendingCounter,
    pub queue: TaskQueue,
}

/// One member of the worker pool
///
/// The result and error senders are owned per worker: once every worker has
/// exited, both channels close and the emitter finishes.
pub(crate) struct Worker {
    id: usize,
    ctx: Arc<WorkerContext>,
    links: mpsc::Sender<Link>,
    errors: mpsc::Sender<PageError>,
    shutdown: ShutdownSignal,
}

impl Worker {
    pub fn new(
        id: usize,
        ctx: Arc<WorkerContext>,
        links: mpsc::Sender<Link>,
        errors: mpsc::Sender<PageError>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            id,
            ctx,
            links,
            errors,
            shutdown,
        }
    }

    /// Processes tasks until shutdown
    pub async fn run(mut self) {
        tracing::debug!("Worker {} spawned", self.id);

        loop {
            let task = tokio::select! {
                biased;
                _ = self.shutdown.triggered() => break,
                task = self.ctx.queue.pop() => match task {
                    Some(task) => task,
                    None => break,
                },
            };

            let _guard = self.ctx.pending.finish_on_drop();
            match task {
                Task::CrawlPage { url, depth } => self.crawl_page(&url, depth).await,
                Task::FetchPageDetail { link } => self.fetch_page_detail(link).await,
            }
        }

        tracing::debug!("Worker {} exit", self.id);
    }

    /// Fetches a page, follows its links, and queues work for new ones
    async fn crawl_page(&self, url: &str, depth: u32) {
        tracing::debug!("Crawling {} at depth {}", url, depth);

        let (base, body) = match self.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                self.report(e).await;
                return;
            }
        };

        let (links, parse_errors) = parse_links(&body, &base);
        for error in parse_errors {
            self.report(error).await;
        }

        let mut kept = Vec::new();
        for link in links {
            match self.ctx.pruner.should_keep(url, &link.url) {
                Ok(true) => kept.push(link),
                Ok(false) => tracing::trace!("Pruned {} (from {})", link.url, url),
                Err(e) => self.report(e).await,
            }
        }

        let breadth = self.ctx.settings.max_breadth;
        if breadth > 0 && kept.len() > breadth {
            kept.truncate(breadth);
        }

        let follow = depth + 1 < self.ctx.settings.max_depth;
        for mut link in kept {
            if !self.ctx.visited.insert(&link.url) {
                continue;
            }

            link.depth = depth;
            if follow {
                let child = Task::CrawlPage {
                    url: link.url.clone(),
                    depth: depth + 1,
                };
                self.enqueue(Task::FetchPageDetail { link }).await;
                self.enqueue(child).await;
            } else {
                self.enqueue(Task::FetchPageDetail { link }).await;
            }
        }
    }

    /// Fetches the target page of a link and emits the completed record
    ///
    /// The record is emitted even when the fetch fails.
    async fn fetch_page_detail(&self, mut link: Link) {
        match self.fetch(&link.url).await {
            Ok((_, body)) => {
                let page = parse_page(&body);
                if page.title.is_none() {
                    self.report(PageError::MissingTitle {
                        url: link.url.clone(),
                    })
                    .await;
                }
                link.title = page.title;
                if self.ctx.settings.include_content {
                    link.content = Some(page.content);
                }
            }
            Err(e) => self.report(e).await,
        }

        if self.links.send(link).await.is_err() {
            tracing::warn!("Result channel closed, record dropped");
        }
    }

    /// Throttles on the URL's host, then fetches it
    async fn fetch(&self, raw: &str) -> Result<(Url, String), PageError> {
        let url = Url::parse(raw).map_err(|_| PageError::MissingHost {
            url: raw.to_string(),
        })?;
        let host = extract_domain(&url).ok_or_else(|| PageError::MissingHost {
            url: raw.to_string(),
        })?;

        self.ctx.throttler.acquire(&host).await;
        let body = self.ctx.fetcher.fetch(&url).await?;
        Ok((url, body))
    }

    /// Counts a new task, then queues it
    async fn enqueue(&self, task: Task) {
        self.ctx.pending.task_created();
        if let Err(e) = self.ctx.queue.push(task).await {
            tracing::error!("Task queue closed, dropping task for {}", e.0.url());
            self.ctx.pending.task_finished();
        }
    }

    async fn report(&self, error: PageError) {
        tracing::debug!("Worker {}: {}", self.id, error);
        if self.errors.send(error).await.is_err() {
            tracing::warn!("Error channel closed, error dropped");
        }
    }
}
