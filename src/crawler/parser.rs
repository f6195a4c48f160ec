//! HTML parser for extracting links and readable text
//!
//! This module handles parsing rendered markup to extract:
//! - In-domain links worth following (from `<a href>` tags)
//! - Plain page text with non-content elements removed

use crate::url::{has_skipped_extension, is_same_host, normalize_parsed};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose whole subtree is dropped from page text
const NON_CONTENT_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "meta", "iframe",
    "frame", "object", "embed", "svg", "template", "head",
];

/// Phrases that mark an anti-bot wall or an access-denied page
const BLOCKING_PHRASES: &[&str] = &[
    "access denied",
    "captcha",
    "cloudflare",
    "checking your browser",
    "attention required",
    "verify you are human",
    "you have been blocked",
    "blocked",
];

/// Extracts the crawlable in-domain links from a page
///
/// # Link Extraction Rules
///
/// - Only the first `max_links` `<a href>` elements are inspected
/// - `href` is resolved against `base_url`
/// - Only `http`/`https` links on the same host as `base_url` are kept
/// - Links to documents, images, archives and media are dropped
/// - Kept links are normalized (no query, fragment or trailing slash) and
///   deduplicated, in document order
///
/// A malformed link is skipped; an empty result is valid.
///
/// # Example
///
/// ```
/// use site_harvest::crawler::extract_links;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let html = r#"<a href="/about/?ref=nav">About</a><a href="https://other.com/">Out</a>"#;
/// assert_eq!(extract_links(&base, html, 100), vec!["https://example.com/about"]);
/// ```
pub fn extract_links(base_url: &Url, markup: &str, max_links: usize) -> Vec<String> {
    let document = Html::parse_document(markup);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector).take(max_links) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if let Some(normalized) = resolve_link(href, base_url) {
            if seen.insert(normalized.clone()) {
                links.push(normalized);
            }
        }
    }

    links
}

/// Resolves a link href and returns its normalized form if it should be followed
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let absolute = base_url.join(href).ok()?;

    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    if !is_same_host(&absolute, base_url) || has_skipped_extension(&absolute) {
        return None;
    }

    normalize_parsed(&absolute).ok()
}

/// Extracts readable text from rendered markup
///
/// Non-content subtrees (scripts, styles, navigation, headers, footers,
/// asides, frames...) are skipped. Whitespace inside each text node is
/// collapsed to single spaces, and text nodes are joined with newlines.
pub fn extract_text(markup: &str) -> String {
    let document = Html::parse_document(markup);
    let mut pieces = Vec::new();
    collect_text(document.root_element(), &mut pieces);
    pieces.join("\n")
}

fn collect_text(element: ElementRef<'_>, pieces: &mut Vec<String>) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if !NON_CONTENT_ELEMENTS.contains(&name) {
                collect_text(child_element, pieces);
            }
        } else if let Some(text) = child.value().as_text() {
            let collapsed = collapse_whitespace(text);
            if !collapsed.is_empty() {
                pieces.push(collapsed);
            }
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Counts whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Returns the first blocking phrase found in the text (case-insensitive)
pub fn find_blocking_phrase(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    BLOCKING_PHRASES
        .iter()
        .copied()
        .find(|phrase| lowered.contains(phrase))
}
