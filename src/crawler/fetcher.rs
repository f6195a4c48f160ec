//! Page fetcher implementation
//!
//! This module loads one URL through a browsing context, including:
//! - Opening an isolated tab per attempt and always closing it
//! - Bounded navigation timeout and a short settle delay
//! - Text extraction and outcome classification
//! - Retry logic for transient failures

use crate::browser::{BrowserTab, BrowsingContext};
use crate::config::CrawlerSettings;
use crate::crawler::parser::{extract_text, find_blocking_phrase, word_count};
use crate::state::FetchOutcome;
use crate::BrowserError;
use std::fmt::Display;

/// Error messages longer than this are cut before being recorded
const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// Final result of fetching one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFetch {
    /// Outcome of the last attempt
    pub outcome: FetchOutcome,

    /// Number of navigation attempts made
    pub attempts: u32,

    /// URL the last attempt ended on after redirects, if it got that far
    pub final_url: Option<String>,
}

/// Fetches a page, retrying transient failures
///
/// # Retry Logic
///
/// | Outcome | Action |
/// |---------|--------|
/// | Success | Stop |
/// | Blocked | Stop immediately, never retried |
/// | Timeout | Retry while attempts remain |
/// | NetworkError (HTTP >= 400) | Retry while attempts remain |
/// | ContentTooShort | Retry while attempts remain |
/// | UnknownError | Retry while attempts remain |
///
/// Attempts are separated by `settings.retry_delay()`. The outcome of the
/// last attempt is returned; the page's markup is available through
/// [`FetchOutcome::raw_markup`] when it succeeded.
pub async fn fetch_page(
    context: &dyn BrowsingContext,
    url: &str,
    company: &str,
    settings: &CrawlerSettings,
) -> PageFetch {
    let max_attempts = settings.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        let (outcome, final_url) = attempt_fetch(context, url, settings).await;

        tracing::debug!(
            company,
            url,
            attempt = attempts,
            status = %outcome.kind(),
            "Fetch attempt finished"
        );

        if outcome.is_terminal() || attempts >= max_attempts {
            return PageFetch {
                outcome,
                attempts,
                final_url,
            };
        }

        tokio::time::sleep(settings.retry_delay()).await;
    }
}

/// Runs one attempt in a fresh tab, closing the tab on every path
async fn attempt_fetch(
    context: &dyn BrowsingContext,
    url: &str,
    settings: &CrawlerSettings,
) -> (FetchOutcome, Option<String>) {
    let mut tab = match context.open_tab().await {
        Ok(tab) => tab,
        Err(e) => return (unknown_error(e), None),
    };

    let mut final_url = None;
    let outcome = load_and_classify(&mut *tab, url, settings, &mut final_url).await;

    if let Err(e) = tab.close().await {
        tracing::debug!("Failed to close tab for {}: {}", url, e);
    }

    (outcome, final_url)
}

async fn load_and_classify(
    tab: &mut dyn BrowserTab,
    url: &str,
    settings: &CrawlerSettings,
    final_url: &mut Option<String>,
) -> FetchOutcome {
    let navigation = match tokio::time::timeout(settings.page_timeout(), tab.navigate(url)).await
    {
        Err(_) | Ok(Err(BrowserError::Timeout)) => return FetchOutcome::Timeout,
        Ok(Err(e)) => return unknown_error(e),
        Ok(Ok(navigation)) => navigation,
    };
    *final_url = navigation.final_url;

    if let Some(http_status) = navigation.status.filter(|s| *s >= 400) {
        return FetchOutcome::NetworkError { http_status };
    }

    let settle = settings.settle_delay();
    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    match tab.content().await {
        Ok(markup) => classify_markup(markup, settings.min_words),
        Err(e) => unknown_error(e),
    }
}

/// Classifies rendered markup into a terminal or retryable outcome
///
/// The word-count check runs before blocking detection, so a short
/// challenge page is reported as too short and retried.
pub fn classify_markup(markup: String, min_words: usize) -> FetchOutcome {
    let text = extract_text(&markup);
    let words = word_count(&text);

    if words < min_words {
        return FetchOutcome::ContentTooShort { word_count: words };
    }

    if let Some(phrase) = find_blocking_phrase(&text) {
        return FetchOutcome::Blocked {
            reason: phrase.to_string(),
        };
    }

    FetchOutcome::Success {
        text,
        raw_markup: markup,
        word_count: words,
    }
}

fn unknown_error(error: impl Display) -> FetchOutcome {
    FetchOutcome::UnknownError {
        message: truncate_message(&error.to_string()),
    }
}

fn truncate_message(message: &str) -> String {
    message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}
