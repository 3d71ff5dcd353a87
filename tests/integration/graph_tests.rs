//! Crawl properties over synthetic link graphs

use crate::csv_rows;
use async_trait::async_trait;
use linkwave::config::ThrottlePolicy;
use linkwave::crawler::{Fetcher, SameHost};
use linkwave::{CrawlSettings, Crawler, PageError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Serves HTML from an in-memory map and counts requests per URL
struct GraphFetcher {
    pages: HashMap<String, String>,
    hits: Mutex<HashMap<String, usize>>,
    delay: Duration,
}

impl GraphFetcher {
    /// Builds pages from `(url, [href])` adjacency entries
    fn new(graph: &[(&str, &[&str])]) -> Self {
        let pages = graph
            .iter()
            .map(|(url, links)| {
                let anchors: String = links
                    .iter()
                    .map(|href| format!(r#"<a href="{href}">link to {href}</a>"#))
                    .collect();
                let title = url.rsplit('/').next().unwrap_or_default();
                let html = format!(
                    "<html><head><title>{title}</title></head><body><p>page {title}</p>{anchors}</body></html>"
                );
                (url.to_string(), html)
            })
            .collect();

        Self {
            pages,
            hits: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
        }
    }

    fn from_pages(pages: HashMap<String, String>) -> Self {
        Self {
            pages,
            hits: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for GraphFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, PageError> {
        *self
            .hits
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| PageError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

fn settings(max_depth: u32, max_breadth: usize) -> CrawlSettings {
    CrawlSettings {
        max_depth,
        max_breadth,
        workers: 4,
        request_interval: Duration::ZERO,
        throttle_policy: ThrottlePolicy::AllHosts,
        include_content: true,
    }
}

struct Outcome {
    rows: Vec<Vec<String>>,
    errors: String,
    report: linkwave::CrawlReport,
}

async fn run(crawler: &Crawler, seeds: &[&str]) -> Outcome {
    let seeds: Vec<String> = seeds.iter().map(|s| s.to_string()).collect();
    let mut out = Vec::new();
    let mut err = Vec::new();

    let report = tokio::time::timeout(
        Duration::from_secs(30),
        crawler.crawl(&seeds, &mut out, &mut err),
    )
    .await
    .expect("crawl did not terminate")
    .expect("crawl failed");

    Outcome {
        rows: csv_rows(&out),
        errors: String::from_utf8(err).unwrap(),
        report,
    }
}

fn urls(rows: &[Vec<String>]) -> Vec<&str> {
    let mut urls: Vec<&str> = rows.iter().map(|row| row[1].as_str()).collect();
    urls.sort();
    urls
}

#[tokio::test]
async fn test_cycle_terminates_and_emits_each_page_once() {
    let fetcher = Arc::new(GraphFetcher::new(&[
        ("https://g.test/a", &["/b"]),
        ("https://g.test/b", &["/a"]),
    ]));
    let crawler = Crawler::new(settings(2, 0), fetcher.clone());

    let outcome = run(&crawler, &["https://g.test/a"]).await;

    assert_eq!(urls(&outcome.rows), vec!["https://g.test/a", "https://g.test/b"]);
    assert!(outcome.errors.is_empty(), "errors: {}", outcome.errors);
    assert_eq!(outcome.report.records_emitted, 2);

    // b was found on the seed (depth 0), a was found on b (depth 1)
    let depth_of = |url: &str| {
        outcome
            .rows
            .iter()
            .find(|row| row[1] == url)
            .map(|row| row[0].clone())
    };
    assert_eq!(depth_of("https://g.test/b").as_deref(), Some("0"));
    assert_eq!(depth_of("https://g.test/a").as_deref(), Some("1"));
}

#[tokio::test]
async fn test_diamond_emits_shared_child_once() {
    let fetcher = Arc::new(GraphFetcher::new(&[
        ("https://g.test/a", &["/b", "/c"]),
        ("https://g.test/b", &["/d"]),
        ("https://g.test/c", &["/d"]),
        ("https://g.test/d", &[]),
    ]));
    let crawler = Crawler::new(settings(3, 0), fetcher.clone());

    let outcome = run(&crawler, &["https://g.test/a"]).await;

    assert_eq!(
        urls(&outcome.rows),
        vec!["https://g.test/b", "https://g.test/c", "https://g.test/d"]
    );
    assert_eq!(outcome.report.urls_visited, 3);
    // One detail fetch and one crawl fetch
    assert_eq!(fetcher.hits("https://g.test/d"), 2);
}

#[tokio::test]
async fn test_depth_one_only_emits_seed_links() {
    let fetcher = Arc::new(GraphFetcher::new(&[
        ("https://g.test/a", &["/b"]),
        ("https://g.test/b", &["/c"]),
        ("https://g.test/c", &[]),
    ]));
    let crawler = Crawler::new(settings(1, 0), fetcher.clone());

    let outcome = run(&crawler, &["https://g.test/a"]).await;

    assert_eq!(urls(&outcome.rows), vec!["https://g.test/b"]);
    // b is fetched for its details but never crawled
    assert_eq!(fetcher.hits("https://g.test/b"), 1);
    assert_eq!(fetcher.hits("https://g.test/c"), 0);
}

#[tokio::test]
async fn test_content_selecting_query_params_keep_pages_apart() {
    let fetcher = Arc::new(GraphFetcher::new(&[
        (
            "https://g.test/",
            &[
                "/view?source=alpha",
                "/view?source=beta",
                "/item?ref=1",
                "/item?ref=2&utm_medium=mail",
            ],
        ),
        ("https://g.test/view?source=alpha", &[]),
        ("https://g.test/view?source=beta", &[]),
        ("https://g.test/item?ref=1", &[]),
        ("https://g.test/item?ref=2&utm_medium=mail", &[]),
    ]));
    let crawler = Crawler::new(settings(1, 0), fetcher);

    let outcome = run(&crawler, &["https://g.test/"]).await;

    assert_eq!(
        urls(&outcome.rows),
        vec![
            "https://g.test/item?ref=1",
            "https://g.test/item?ref=2&utm_medium=mail",
            "https://g.test/view?source=alpha",
            "https://g.test/view?source=beta",
        ]
    );
}

#[tokio::test]
async fn test_depth_zero_behaves_like_one() {
    let fetcher = Arc::new(GraphFetcher::new(&[
        ("https://g.test/a", &["/b"]),
        ("https://g.test/b", &["/c"]),
    ]));
    let crawler = Crawler::new(settings(0, 0), fetcher);

    let outcome = run(&crawler, &["https://g.test/a"]).await;

    assert_eq!(urls(&outcome.rows), vec!["https://g.test/b"]);
}

#[tokio::test]
async fn test_breadth_keeps_first_links_in_document_order() {
    let fetcher = Arc::new(GraphFetcher::new(&[
        ("https://g.test/a", &["/1", "/2", "/3", "/4", "/5"]),
        ("https://g.test/1", &[]),
        ("https://g.test/2", &[]),
        ("https://g.test/3", &[]),
        ("https://g.test/4", &[]),
        ("https://g.test/5", &[]),
    ]));
    let crawler = Crawler::new(settings(2, 2), fetcher.clone());

    let outcome = run(&crawler, &["https://g.test/a"]).await;

    assert_eq!(urls(&outcome.rows), vec!["https://g.test/1", "https://g.test/2"]);
    assert_eq!(fetcher.hits("https://g.test/3"), 0);
}

#[tokio::test]
async fn test_same_host_pruner_drops_foreign_links() {
    let fetcher = Arc::new(GraphFetcher::new(&[
        ("https://x.test/a", &["https://x.test/b", "https://y.test/b"]),
        ("https://x.test/b", &[]),
        ("https://y.test/b", &[]),
    ]));
    let crawler = Crawler::new(settings(2, 0), fetcher.clone()).with_pruner(Arc::new(SameHost));

    let outcome = run(&crawler, &["https://x.test/a"]).await;

    assert_eq!(urls(&outcome.rows), vec!["https://x.test/b"]);
    assert_eq!(fetcher.hits("https://y.test/b"), 0);
}

#[tokio::test]
async fn test_empty_seed_list_writes_header_only() {
    let crawler = Crawler::new(settings(2, 0), Arc::new(GraphFetcher::new(&[])));
    let mut out = Vec::new();

    let report = crawler
        .crawl(&[], &mut out, std::io::sink())
        .await
        .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "Depth,Url,Text,Title,Content\n");
    assert_eq!(report.tasks_created, 0);
    assert_eq!(report.records_emitted, 0);
    assert!(!report.stopped);
}

#[tokio::test]
async fn test_failed_detail_fetch_still_emits_record() {
    let fetcher = Arc::new(GraphFetcher::new(&[("https://g.test/a", &["/missing"])]));
    let crawler = Crawler::new(settings(1, 0), fetcher);

    let outcome = run(&crawler, &["https://g.test/a"]).await;

    assert_eq!(
        outcome.rows,
        vec![vec![
            "0".to_string(),
            "https://g.test/missing".to_string(),
            "link to /missing".to_string(),
            String::new(),
            String::new(),
        ]]
    );
    assert_eq!(outcome.report.errors_reported, 1);
    assert!(outcome.errors.contains("https://g.test/missing"));
    assert!(outcome.errors.contains("HTTP 404"));
}

#[tokio::test]
async fn test_content_column_can_be_disabled() {
    let fetcher = Arc::new(GraphFetcher::new(&[
        ("https://g.test/a", &["/b"]),
        ("https://g.test/b", &[]),
    ]));
    let mut settings = settings(1, 0);
    settings.include_content = false;
    let crawler = Crawler::new(settings, fetcher);

    let outcome = run(&crawler, &["https://g.test/a"]).await;

    assert_eq!(outcome.rows.len(), 1);
    assert_eq!(outcome.rows[0][3], "b");
    assert_eq!(outcome.rows[0][4], "");
}

#[tokio::test]
async fn test_pending_counter_balances() {
    let fetcher = Arc::new(GraphFetcher::new(&[
        ("https://g.test/a", &["/b", "/c"]),
        ("https://g.test/b", &["/c", "/d"]),
        ("https://g.test/c", &["/a"]),
        ("https://g.test/d", &[]),
    ]));
    let crawler = Crawler::new(settings(3, 0), fetcher);

    let outcome = run(&crawler, &["https://g.test/a"]).await;

    let report = &outcome.report;
    assert!(!report.stopped);
    assert_eq!(report.tasks_created, report.tasks_finished);
    assert_eq!(report.tasks_abandoned(), 0);
    assert!(report.peak_pending >= 1);
    assert!(report.peak_pending <= report.tasks_created);
}

#[tokio::test]
async fn test_many_workers_emit_every_page_exactly_once() {
    const PAGES: usize = 200;

    let pages: HashMap<String, String> = (0..PAGES)
        .map(|i| {
            let links: String = [(i + 1) % PAGES, (i + 2) % PAGES, (i * 7) % PAGES]
                .iter()
                .map(|j| format!(r#"<a href="/p{j}">p{j}</a>"#))
                .collect();
            (
                format!("https://g.test/p{i}"),
                format!("<html><head><title>p{i}</title></head><body>{links}</body></html>"),
            )
        })
        .collect();
    let fetcher = Arc::new(GraphFetcher::from_pages(pages));

    let mut settings = settings(u32::MAX, 0);
    settings.workers = 16;
    let crawler = Crawler::new(settings, fetcher.clone());

    let outcome = run(&crawler, &["https://g.test/p0"]).await;

    let emitted = urls(&outcome.rows);
    let mut unique = emitted.clone();
    unique.dedup();
    assert_eq!(emitted.len(), PAGES);
    assert_eq!(unique.len(), PAGES);
    assert_eq!(outcome.report.tasks_created, outcome.report.tasks_finished);

    // Every page: one detail fetch, one crawl fetch (the seed is also crawled
    // once as a seed)
    assert_eq!(fetcher.hits("https://g.test/p0"), 3);
    assert_eq!(fetcher.hits("https://g.test/p1"), 2);
}

#[tokio::test]
async fn test_stop_handle_ends_an_unbounded_crawl() {
    // An endless chain: every page links to one that does not exist yet
    let pages: HashMap<String, String> = (0..10_000)
        .map(|i| {
            (
                format!("https://g.test/n{i}"),
                format!(r#"<a href="/n{}">next</a><a href="/n{}">skip</a>"#, i + 1, i + 2),
            )
        })
        .collect();
    let fetcher =
        Arc::new(GraphFetcher::from_pages(pages).with_delay(Duration::from_millis(5)));
    let crawler = Crawler::new(settings(u32::MAX, 0), fetcher);

    let stop = crawler.stop_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stop.stop();
    });

    let outcome = run(&crawler, &["https://g.test/n0"]).await;

    assert!(outcome.report.stopped);
    assert!(outcome.report.records_emitted < 10_000);
    assert!(outcome.report.tasks_finished <= outcome.report.tasks_created);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_runtime_cyclic_graph_is_crawled_exactly_once() {
    const PAGES: usize = 100;

    // Every page links forward and back to the start, so most links are
    // revisits racing each other across runtime threads
    let pages: HashMap<String, String> = (0..PAGES)
        .map(|i| {
            let links: String = [(i + 1) % PAGES, (i + 3) % PAGES, 0]
                .iter()
                .map(|j| format!(r#"<a href="/c{j}">c{j}</a>"#))
                .collect();
            (
                format!("https://g.test/c{i}"),
                format!("<html><head><title>c{i}</title></head><body>{links}</body></html>"),
            )
        })
        .collect();
    let fetcher = Arc::new(GraphFetcher::from_pages(pages));

    let mut settings = settings(u32::MAX, 0);
    settings.workers = 32;
    let crawler = Crawler::new(settings, fetcher);

    for round in 0..5 {
        let outcome = run(&crawler, &["https://g.test/c0"]).await;

        let emitted = urls(&outcome.rows);
        let mut unique = emitted.clone();
        unique.dedup();
        assert_eq!(emitted.len(), PAGES, "round {round}");
        assert_eq!(unique.len(), PAGES, "round {round}");

        let report = &outcome.report;
        assert!(!report.stopped, "round {round}");
        assert_eq!(report.tasks_created, report.tasks_finished, "round {round}");
        assert!(report.peak_pending <= report.tasks_created, "round {round}");
        assert!(outcome.errors.is_empty(), "round {round}: {}", outcome.errors);
    }
}
