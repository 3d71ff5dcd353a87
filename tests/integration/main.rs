//! Integration tests for the crawler
//!
//! `graph_tests` drives the crawl over an in-process fake fetcher to check
//! graph-shaped properties; `crawl_tests` runs the real HTTP path against
//! wiremock servers.

mod crawl_tests;
mod graph_tests;

/// Parses CSV output (header skipped) into rows of strings
pub fn csv_rows(output: &[u8]) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_reader(output);
    let headers = reader.headers().expect("missing CSV header").clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["Depth", "Url", "Text", "Title", "Content"]
    );

    reader
        .records()
        .map(|record| {
            record
                .expect("malformed CSV row")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}
