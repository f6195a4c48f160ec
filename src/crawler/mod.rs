//! Crawler module for page fetching and site harvesting
//!
//! This module contains the core crawling logic, including:
//! - Page fetching with retry and outcome classification
//! - HTML parsing, text extraction and link extraction
//! - Wave-based crawling of a single site
//! - Batch coordination across sites

mod coordinator;
mod fetcher;
mod parser;
mod site;

pub use coordinator::{Coordinator, Progress, ProgressCallback, RunOutput};
pub use fetcher::{classify_markup, fetch_page, PageFetch};
pub use parser::{extract_links, extract_text, find_blocking_phrase, word_count};
pub use site::{crawl_site, SiteCrawl};

use crate::config::Config;
use crate::Result;

/// Runs a complete harvest for a loaded configuration
///
/// This is the main entry point for a crawl. It will:
/// 1. Launch the configured browser engine
/// 2. Crawl every configured target in batches
/// 3. Close the browser
///
/// Targets are expected to have been validated already.
pub async fn crawl(config: &Config, progress: Option<&ProgressCallback<'_>>) -> Result<RunOutput> {
    let coordinator = Coordinator::new(config.crawler.clone(), config.browser.clone());
    coordinator.crawl_all(&config.crawl_targets(), progress).await
}
