//! HTML parser for extracting links, titles and page text
//!
//! Everything here is a pure function of the HTML text (and, for links, the
//! page URL used to resolve relative hrefs).

use crate::crawler::task::Link;
use crate::PageError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Title and visible text of a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title (from the <title> tag), if present and non-empty
    pub title: Option<String>,

    /// Whitespace-collapsed text of <body>, without scripts and styles
    pub content: String,
}

/// Extracts outbound links from an HTML page
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="...">` anywhere in the document, resolved against
/// `base_url`, fragment removed.
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - empty and fragment-only hrefs (`#section`)
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - anything that does not resolve to http(s)
/// - repeats of a URL already found earlier on the same page
///
/// Hrefs that cannot be joined with `base_url` are returned as errors next
/// to the links that could; a bad href never hides the good ones.
///
/// # Example
///
/// ```
/// use linkwave::crawler::parse_links;
/// use url::Url;
///
/// let html = r#"<a href="/docs"> The  docs </a><a href="/docs#intro">again</a>"#;
/// let base = Url::parse("https://example.com/index.html").unwrap();
/// let (links, errors) = parse_links(html, &base);
/// assert!(errors.is_empty());
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].url, "https://example.com/docs");
/// assert_eq!(links[0].text, "The docs");
/// ```
pub fn parse_links(html: &str, base_url: &Url) -> (Vec<Link>, Vec<PageError>) {
    let document = Html::parse_document(html);
    let mut links = Vec::new();
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return (links, errors);
    };

    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match resolve_link(href, base_url) {
            Ok(Some(url)) => {
                if seen.insert(url.clone()) {
                    links.push(Link::new(url, anchor_text(element)));
                }
            }
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    (links, errors)
}

/// Extracts the page title
///
/// Returns None when there is no <title> or it is blank.
pub fn parse_title(html: &str) -> Option<String> {
    extract_title(&Html::parse_document(html))
}

/// Extracts the title and visible body text of a page
pub fn parse_page(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);
    ParsedPage {
        title: extract_title(&document),
        content: extract_content(&document),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(element.text()))
        .filter(|s| !s.is_empty())
}

fn extract_content(document: &Html) -> String {
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    let visible = body.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
        });
        (!hidden).then_some(&**text)
    });

    collapse_whitespace(visible)
}

fn anchor_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(element.text())
}

/// Joins text fragments, collapsing every whitespace run (newlines included)
/// into a single space
fn collapse_whitespace<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in fragments.flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Resolves an href to an absolute http(s) URL without fragment
///
/// Ok(None) means the link is deliberately skipped.
fn resolve_link(href: &str, base_url: &Url) -> Result<Option<String>, PageError> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return Ok(None);
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return Ok(None);
    }

    let mut absolute_url = base_url.join(href).map_err(|e| PageError::Join {
        base: base_url.to_string(),
        href: href.to_string(),
        message: e.to_string(),
    })?;

    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return Ok(None);
    }

    absolute_url.set_fragment(None);
    Ok(Some(absolute_url.to_string()))
}
