//! End-to-end crawls over HTTP
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle through the real `HttpFetcher`.

use crate::csv_rows;
use linkwave::config::{Config, CrawlerConfig, UserAgentConfig};
use linkwave::Crawler;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from the given seeds
fn create_test_config(seeds: Vec<String>, max_depth: u32, interval_ms: u64) -> Config {
    Config {
        seeds,
        crawler: CrawlerConfig {
            max_depth,
            workers: 4,
            request_interval_ms: interval_ms,
            request_timeout_secs: 5,
            ..Default::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
        },
        ..Default::default()
    }
}

async fn mount_page(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn crawl(config: &Config) -> (Vec<Vec<String>>, String, linkwave::CrawlReport) {
    let crawler = Crawler::from_config(config).expect("Failed to create crawler");
    let mut out = Vec::new();
    let mut err = Vec::new();

    let report = tokio::time::timeout(
        Duration::from_secs(30),
        crawler.crawl(&config.seeds, &mut out, &mut err),
    )
    .await
    .expect("crawl did not terminate")
    .expect("Crawl failed");

    (csv_rows(&out), String::from_utf8(err).unwrap(), report)
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            </body></html>"#,
            base_url
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        r#"<html><head><title>Page 1</title></head><body>Content 1 <a href="/page2">again</a></body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/page2",
        r#"<html><head><title>Page 2</title></head><body>Content 2</body></html>"#.to_string(),
    )
    .await;

    let config = create_test_config(vec![format!("{}/", base_url)], 2, 10);
    let (mut rows, errors, report) = crawl(&config).await;

    rows.sort();
    assert_eq!(
        rows,
        vec![
            vec![
                "0".to_string(),
                format!("{}/page1", base_url),
                "Page 1".to_string(),
                "Page 1".to_string(),
                "Content 1 again".to_string(),
            ],
            vec![
                "0".to_string(),
                format!("{}/page2", base_url),
                "Page 2".to_string(),
                "Page 2".to_string(),
                "Content 2".to_string(),
            ],
        ]
    );
    assert!(errors.is_empty(), "unexpected errors: {}", errors);
    assert_eq!(report.tasks_created, report.tasks_finished);
    assert!(!report.stopped);
}

#[tokio::test]
async fn test_requests_carry_user_agent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>ok</title>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![format!("{}/", base_url)], 1, 0);
    let (rows, errors, _report) = crawl(&config).await;

    assert!(rows.is_empty());
    assert!(errors.is_empty(), "unexpected errors: {}", errors);
}

#[tokio::test]
async fn test_dead_link_is_emitted_and_reported() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title>Home</title></head><body><a href="/gone">Gone</a></body></html>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![format!("{}/", base_url)], 1, 0);
    let (rows, errors, report) = crawl(&config).await;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], format!("{}/gone", base_url));
    assert_eq!(rows[0][3], "");
    assert_eq!(report.errors_reported, 1);
    assert!(errors.contains("returned HTTP 404"), "errors: {}", errors);
}

#[tokio::test]
async fn test_page_without_title_is_reported() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><body><a href="/untitled">Untitled</a></body></html>"#.to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/untitled",
        "<html><body>just text</body></html>".to_string(),
    )
    .await;

    let config = create_test_config(vec![format!("{}/", base_url)], 1, 0);
    let (rows, errors, _report) = crawl(&config).await;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][4], "just text");
    assert!(errors.contains("Did not find title"), "errors: {}", errors);
}

#[tokio::test]
async fn test_same_host_requests_are_throttled() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/a">a</a><a href="/b">b</a>"#.to_string(),
    )
    .await;
    mount_page(&mock_server, "/a", "<title>a</title>".to_string()).await;
    mount_page(&mock_server, "/b", "<title>b</title>".to_string()).await;

    // Seed, then a detail and a crawl fetch for each of /a and /b
    let config = create_test_config(vec![format!("{}/", base_url)], 2, 100);
    let start = Instant::now();
    let (rows, _errors, _report) = crawl(&config).await;
    let elapsed = start.elapsed();

    assert_eq!(rows.len(), 2);
    assert!(
        elapsed >= Duration::from_millis(400),
        "five requests finished in {:?}",
        elapsed
    );
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_invalid_seed_is_a_config_error() {
    let config = create_test_config(vec!["ftp://example.com/".to_string()], 1, 0);
    let crawler = Crawler::from_config(&config).unwrap();

    let err = crawler
        .crawl(&config.seeds, std::io::sink(), std::io::sink())
        .await
        .unwrap_err();

    assert!(err.is_config());
}
