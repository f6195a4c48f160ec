//! Site crawler
//!
//! Crawls one company's site breadth-first in waves. Each wave takes up to
//! `2 × concurrency` URLs from the frontier (never more than the remaining
//! page budget), fetches them with at most `concurrency` in flight, and only
//! once the whole wave has finished records documents, failures and newly
//! discovered links. Link discovery is therefore always one wave behind.

use crate::browser::{BrowserSession, BrowsingContext};
use crate::config::CrawlerSettings;
use crate::crawler::fetcher::{fetch_page, PageFetch};
use crate::crawler::parser::extract_links;
use crate::output::SiteStats;
use crate::state::{CrawlFrontier, CrawledDocument, DocumentMetadata, FailureRecord, FetchOutcome};
use crate::url::{extract_domain, normalize_url};
use crate::{HarvestError, Result};
use chrono::Utc;
use futures::future::join_all;
use std::time::Instant;
use tokio::sync::Semaphore;
use url::Url;

/// Everything one site crawl produced
#[derive(Debug, Clone, Default)]
pub struct SiteCrawl {
    pub documents: Vec<CrawledDocument>,
    pub failures: Vec<FailureRecord>,
    pub stats: SiteStats,
}

/// Crawls one site inside its own browsing context
///
/// The root URL is normalized before seeding, so links back to the home page
/// never re-enter the frontier. The context is closed when the crawl ends.
///
/// # Errors
///
/// Fails only if the root URL cannot be normalized or no browsing context
/// can be opened. Individual page failures are reported in
/// [`SiteCrawl::failures`], never as `Err`.
pub async fn crawl_site(
    session: &dyn BrowserSession,
    root_url: &str,
    company: &str,
    settings: &CrawlerSettings,
) -> Result<SiteCrawl> {
    let seed = normalize_url(root_url)?;
    let context = session
        .new_context()
        .await
        .map_err(|e| HarvestError::Site {
            company: company.to_string(),
            message: e.to_string(),
        })?;

    tracing::info!("Crawling {} from {}", company, seed);
    let crawl = crawl_in_context(context.as_ref(), seed, company, settings).await;

    if let Err(e) = context.close().await {
        tracing::debug!("Failed to close browsing context for {}: {}", company, e);
    }

    tracing::info!(
        "Finished {}: {} visited, {} scraped, {} failed in {:.1}s",
        company,
        crawl.stats.pages_visited,
        crawl.stats.pages_scraped,
        crawl.stats.pages_failed,
        crawl.stats.elapsed_secs
    );

    Ok(crawl)
}

async fn crawl_in_context(
    context: &dyn BrowsingContext,
    seed: String,
    company: &str,
    settings: &CrawlerSettings,
) -> SiteCrawl {
    let start = Instant::now();
    let semaphore = Semaphore::new(settings.concurrency.max(1));
    let mut frontier = CrawlFrontier::new(seed);
    let mut crawl = SiteCrawl::default();

    while !frontier.is_exhausted() && frontier.visited_count() < settings.max_pages {
        let remaining = settings.max_pages - frontier.visited_count();
        let wave = frontier.take_wave(settings.wave_size().min(remaining));
        debug_assert!(frontier.is_disjoint());

        tracing::debug!(
            company,
            wave = wave.len(),
            visited = frontier.visited_count(),
            pending = frontier.pending_count(),
            "Dispatching wave"
        );

        let fetches = wave.iter().map(|url| {
            let semaphore = &semaphore;
            async move {
                // The semaphore is never closed, so acquire cannot fail
                let _permit = semaphore.acquire().await.ok();
                fetch_page(context, url, company, settings).await
            }
        });
        let results = join_all(fetches).await;

        for (url, fetch) in wave.into_iter().zip(results) {
            record_fetch(&mut crawl, &mut frontier, url, fetch, company, settings);
        }
        debug_assert!(frontier.is_disjoint());
    }

    crawl.stats.pages_visited = frontier.visited_count();
    crawl.stats.elapsed_secs = start.elapsed().as_secs_f64();
    crawl
}

/// Folds one finished fetch into the crawl results and the frontier
fn record_fetch(
    crawl: &mut SiteCrawl,
    frontier: &mut CrawlFrontier,
    url: String,
    fetch: PageFetch,
    company: &str,
    settings: &CrawlerSettings,
) {
    match fetch.outcome {
        FetchOutcome::Success {
            text,
            raw_markup,
            word_count,
        } => {
            let parsed = Url::parse(&url).ok();
            let domain = parsed.as_ref().and_then(extract_domain).unwrap_or_default();

            // Links are relative to where the page ended up, not where it was requested
            let base = fetch
                .final_url
                .as_deref()
                .and_then(|final_url| Url::parse(final_url).ok())
                .or(parsed);
            if let Some(base) = &base {
                let mut added = 0;
                for link in extract_links(base, &raw_markup, settings.max_links_per_page) {
                    if frontier.offer(link) {
                        added += 1;
                    }
                }
                tracing::debug!("{} yielded {} new links", url, added);
            }

            crawl.stats.record_success(&domain);
            crawl.documents.push(CrawledDocument {
                text,
                metadata: DocumentMetadata {
                    company_name: company.to_string(),
                    source_url: url,
                    domain,
                    word_count,
                    scraped_at: Utc::now(),
                },
            });
        }
        outcome => {
            let status = outcome.kind();
            tracing::warn!(
                "Failed {} after {} attempt(s): {} ({})",
                url,
                fetch.attempts,
                status,
                outcome.detail()
            );

            crawl.stats.record_failure(status);
            crawl.failures.push(FailureRecord {
                url,
                company_name: company.to_string(),
                status,
                error_detail: outcome.detail(),
            });
        }
    }
}
