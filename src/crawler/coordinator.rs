//! Crawl coordinator - cross-site batch orchestration
//!
//! This module runs the site crawls of a harvest, including:
//! - Launching the one browser shared by the whole run and closing it
//! - Splitting targets into sequential batches
//! - Running every site of a batch concurrently
//! - Merging each finished site into the run-wide statistics
//! - Reporting progress after every batch

use crate::browser::{launch_session, BrowserSession};
use crate::config::{BrowserSettings, CrawlerSettings};
use crate::crawler::site::{crawl_site, SiteCrawl};
use crate::output::RunStats;
use crate::state::{CrawledDocument, FailureRecord};
use crate::targets::CrawlTarget;
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Progress report emitted after each batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Pages visited so far across all finished sites
    pub pages_visited: usize,

    /// Upper bound on pages for the run: `targets × max_pages`
    pub expected_pages: usize,

    pub batches_done: usize,
    pub batches_total: usize,
}

/// Callback invoked with a [`Progress`] report after each batch
pub type ProgressCallback<'a> = dyn Fn(Progress) + Send + Sync + 'a;

/// Everything a harvest run produced
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub documents: Vec<CrawledDocument>,
    pub failures: Vec<FailureRecord>,
    pub stats: RunStats,
}

/// Main crawl coordinator structure
pub struct Coordinator {
    crawler: Arc<CrawlerSettings>,
    browser: BrowserSettings,
}

impl Coordinator {
    /// Creates a coordinator for the given crawl and browser settings
    pub fn new(crawler: CrawlerSettings, browser: BrowserSettings) -> Self {
        Self {
            crawler: Arc::new(crawler),
            browser,
        }
    }

    /// Crawls every target with one shared browser
    ///
    /// The browser is launched once and closed when the run ends, whatever
    /// happened to the individual sites.
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutput)` - All batches completed; failed sites are simply absent
    /// * `Err(HarvestError)` - The browser could not be launched
    pub async fn crawl_all(
        &self,
        targets: &[CrawlTarget],
        progress: Option<&ProgressCallback<'_>>,
    ) -> Result<RunOutput> {
        let session = launch_session(&self.browser, self.crawler.page_timeout()).await?;

        let output = self
            .crawl_all_with_session(Arc::clone(&session), targets, progress)
            .await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }

        Ok(output)
    }

    /// Crawls every target with a browser session owned by the caller
    ///
    /// Targets run in batches of `batch_size`. Batches run one after another;
    /// the sites inside a batch run concurrently, each in its own browsing
    /// context. A site that fails as a whole is logged and left out of the
    /// output, and the run continues with the remaining sites.
    ///
    /// The session is not closed.
    pub async fn crawl_all_with_session(
        &self,
        session: Arc<dyn BrowserSession>,
        targets: &[CrawlTarget],
        progress: Option<&ProgressCallback<'_>>,
    ) -> RunOutput {
        let start = Instant::now();
        let batch_size = self.crawler.batch_size.max(1);
        let batches_total = targets.len().div_ceil(batch_size);
        let expected_pages = targets.len() * self.crawler.max_pages;
        let mut output = RunOutput::default();

        tracing::info!(
            "Harvesting {} site(s) in {} batch(es) of up to {}",
            targets.len(),
            batches_total,
            batch_size
        );

        for (index, batch) in targets.chunks(batch_size).enumerate() {
            tracing::info!("Starting batch {}/{}", index + 1, batches_total);

            for (target, crawl) in self.run_batch(&session, batch).await {
                merge_site(&mut output, &target, crawl);
            }

            let report = Progress {
                pages_visited: output.stats.total_pages_visited,
                expected_pages,
                batches_done: index + 1,
                batches_total,
            };
            tracing::info!(
                "Batch {}/{} done: {} of up to {} pages visited",
                report.batches_done,
                report.batches_total,
                report.pages_visited,
                report.expected_pages
            );
            if let Some(callback) = progress {
                callback(report);
            }
        }

        output.stats.elapsed_secs = start.elapsed().as_secs_f64();
        output
    }

    /// Runs one batch of site crawls concurrently
    ///
    /// Returns the sites that finished, in target order.
    async fn run_batch(
        &self,
        session: &Arc<dyn BrowserSession>,
        batch: &[CrawlTarget],
    ) -> Vec<(CrawlTarget, SiteCrawl)> {
        let mut tasks = JoinSet::new();

        for (position, target) in batch.iter().cloned().enumerate() {
            let session = Arc::clone(session);
            let settings = Arc::clone(&self.crawler);
            tasks.spawn(async move {
                let result = crawl_site(
                    session.as_ref(),
                    &target.root_url,
                    &target.company_name,
                    &settings,
                )
                .await;
                (position, target, result)
            });
        }

        let mut finished = Vec::with_capacity(batch.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, target, Ok(crawl))) => finished.push((position, target, crawl)),
                Ok((_, target, Err(e))) => {
                    tracing::warn!("Crawl of {} failed, skipping: {}", target.company_name, e);
                }
                Err(e) => tracing::warn!("Site crawl task aborted: {}", e),
            }
        }

        finished.sort_by_key(|(position, _, _)| *position);
        finished
            .into_iter()
            .map(|(_, target, crawl)| (target, crawl))
            .collect()
    }
}

fn merge_site(output: &mut RunOutput, target: &CrawlTarget, crawl: SiteCrawl) {
    output.stats.merge_site(&target.company_name, &crawl.stats);
    output.documents.extend(crawl.documents);
    output.failures.extend(crawl.failures);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{page_html, MockBrowser, MockPage};
    use crate::config::BrowserEngine;
    use crate::state::StatusKind;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;
    use std::time::Duration;

    fn fast_settings() -> CrawlerSettings {
        CrawlerSettings {
            settle_delay_ms: 0,
            retry_delay_ms: 0,
            ..CrawlerSettings::default()
        }
    }

    fn coordinator(settings: CrawlerSettings) -> Coordinator {
        Coordinator::new(settings, BrowserSettings::default())
    }

    fn two_site_browser() -> MockBrowser {
        MockBrowser::new()
            .page(
                "https://acme.test",
                MockPage::Html(page_html(60, &["/products", "/contact"])),
            )
            .page("https://acme.test/products", MockPage::Html(page_html(60, &[])))
            .page("https://acme.test/contact", MockPage::Html(page_html(5, &[])))
            .page("https://globex.test", MockPage::Html(page_html(60, &["/about"])))
            .page("https://globex.test/about", MockPage::Html(page_html(60, &[])))
    }

    #[tokio::test]
    async fn test_two_targets_single_batch() {
        let (session, state) = two_site_browser().build();
        let targets = vec![
            CrawlTarget::new("Acme", "https://acme.test"),
            CrawlTarget::new("Globex", "https://globex.test"),
        ];
        let reports = Mutex::new(Vec::new());
        let callback = |p: Progress| reports.lock().unwrap().push(p);

        let output = coordinator(fast_settings())
            .crawl_all_with_session(session, &targets, Some(&callback))
            .await;

        assert_eq!(output.stats.company_stats.len(), 2);
        assert_eq!(output.documents.len(), 4);
        assert_eq!(output.failures.len(), 1);
        assert_eq!(output.failures[0].status, StatusKind::ContentTooShort);
        assert_eq!(state.contexts_opened.load(Ordering::SeqCst), 2);
        assert_eq!(state.contexts_closed.load(Ordering::SeqCst), 2);

        let reports = reports.into_inner().unwrap();
        assert_eq!(
            reports,
            vec![Progress {
                pages_visited: 5,
                expected_pages: 40,
                batches_done: 1,
                batches_total: 1,
            }]
        );
    }

    #[tokio::test]
    async fn test_run_totals_equal_company_sums() {
        let (session, _state) = two_site_browser().build();
        let targets = vec![
            CrawlTarget::new("Acme", "https://acme.test"),
            CrawlTarget::new("Globex", "https://globex.test"),
        ];

        let output = coordinator(fast_settings())
            .crawl_all_with_session(session, &targets, None)
            .await;

        let stats = &output.stats;
        let sum = |f: fn(&crate::output::SiteStats) -> usize| -> usize {
            stats.company_stats.values().map(f).sum()
        };
        assert_eq!(stats.pages_scraped, sum(|s| s.pages_scraped));
        assert_eq!(stats.pages_failed, sum(|s| s.pages_failed));
        assert_eq!(stats.total_pages_visited, sum(|s| s.pages_visited));
        assert_eq!(stats.pages_per_domain.get("acme.test"), Some(&2));
        assert_eq!(stats.pages_per_domain.get("globex.test"), Some(&2));
    }

    #[tokio::test]
    async fn test_batches_report_cumulative_progress() {
        let mut browser = MockBrowser::new();
        let mut targets = Vec::new();
        for i in 0..4 {
            let root = format!("https://site{}.test", i);
            browser = browser.page(&root, MockPage::Html(page_html(60, &[])));
            targets.push(CrawlTarget::new(format!("Company {}", i), root));
        }
        let (session, state) = browser.build();
        let settings = CrawlerSettings {
            batch_size: 3,
            max_pages: 5,
            ..fast_settings()
        };
        let reports = Mutex::new(Vec::new());
        let callback = |p: Progress| reports.lock().unwrap().push(p);

        let output = coordinator(settings)
            .crawl_all_with_session(session, &targets, Some(&callback))
            .await;

        assert_eq!(output.stats.company_stats.len(), 4);
        assert_eq!(state.contexts_opened.load(Ordering::SeqCst), 4);

        let reports = reports.into_inner().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!((reports[0].pages_visited, reports[0].batches_done), (3, 1));
        assert_eq!((reports[1].pages_visited, reports[1].batches_done), (4, 2));
        assert!(reports.iter().all(|r| r.expected_pages == 20 && r.batches_total == 2));
    }

    #[tokio::test]
    async fn test_failed_site_is_skipped() {
        let (session, _state) = two_site_browser().build();
        let targets = vec![
            CrawlTarget::new("Broken", "not a url"),
            CrawlTarget::new("Globex", "https://globex.test"),
        ];

        let output = coordinator(fast_settings())
            .crawl_all_with_session(session, &targets, None)
            .await;

        assert!(!output.stats.company_stats.contains_key("Broken"));
        assert_eq!(output.stats.company_stats.len(), 1);
        assert_eq!(output.documents.len(), 2);
        assert!(output
            .documents
            .iter()
            .all(|d| d.metadata.company_name == "Globex"));
    }

    #[tokio::test]
    async fn test_documents_follow_target_order() {
        let (session, _state) = two_site_browser().build();
        let targets = vec![
            CrawlTarget::new("Globex", "https://globex.test"),
            CrawlTarget::new("Acme", "https://acme.test"),
        ];

        let output = coordinator(fast_settings())
            .crawl_all_with_session(session, &targets, None)
            .await;

        let companies: Vec<&str> = output
            .documents
            .iter()
            .map(|d| d.metadata.company_name.as_str())
            .collect();
        assert_eq!(companies, vec!["Globex", "Globex", "Acme", "Acme"]);
    }

    #[tokio::test]
    async fn test_duplicate_company_names_are_summed() {
        let (session, _state) = two_site_browser().build();
        let targets = vec![
            CrawlTarget::new("Acme", "https://acme.test"),
            CrawlTarget::new("Acme", "https://globex.test"),
        ];

        let output = coordinator(fast_settings())
            .crawl_all_with_session(session, &targets, None)
            .await;

        assert_eq!(output.stats.company_stats.len(), 1);
        assert_eq!(output.stats.company_stats["Acme"].pages_scraped, 4);
        assert_eq!(output.stats.pages_scraped, 4);
    }

    #[tokio::test]
    async fn test_crawl_all_with_http_engine_records_unreachable_site() {
        let browser = BrowserSettings {
            engine: BrowserEngine::Http,
            ..BrowserSettings::default()
        };
        let settings = CrawlerSettings {
            max_attempts: 1,
            page_timeout_secs: 5,
            ..fast_settings()
        };
        let targets = vec![CrawlTarget::new("Nobody", "http://127.0.0.1:9")];

        let output = Coordinator::new(settings, browser)
            .crawl_all(&targets, None)
            .await
            .unwrap();

        assert!(output.documents.is_empty());
        assert_eq!(output.failures.len(), 1);
        assert_eq!(output.stats.company_stats["Nobody"].pages_visited, 1);
    }

    fn slow_sites(count: usize) -> (Vec<CrawlTarget>, MockBrowser) {
        let mut browser = MockBrowser::new().delay(Duration::from_millis(50));
        let mut targets = Vec::new();
        for i in 0..count {
            let root = format!("https://site{}.test", i);
            let links: Vec<String> = (0..4).map(|p| format!("/p{}", p)).collect();
            let links: Vec<&str> = links.iter().map(String::as_str).collect();
            browser = browser.page(&root, MockPage::Html(page_html(60, &links)));
            for p in 0..4 {
                browser = browser.page(
                    &format!("{}/p{}", root, p),
                    MockPage::Html(page_html(60, &[])),
                );
            }
            targets.push(CrawlTarget::new(format!("Company {}", i), root));
        }
        (targets, browser)
    }

    #[tokio::test]
    async fn test_sites_in_a_batch_overlap() {
        let (targets, browser) = slow_sites(2);
        let (session, state) = browser.build();
        let settings = CrawlerSettings {
            concurrency: 1,
            batch_size: 2,
            ..fast_settings()
        };

        let output = coordinator(settings)
            .crawl_all_with_session(session, &targets, None)
            .await;

        assert_eq!(output.documents.len(), 10);
        assert_eq!(state.max_open_tabs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_open_tabs_bounded_by_batch_and_concurrency() {
        let (targets, browser) = slow_sites(5);
        let (session, state) = browser.build();
        let settings = CrawlerSettings {
            concurrency: 2,
            batch_size: 2,
            ..fast_settings()
        };

        let output = coordinator(settings)
            .crawl_all_with_session(session, &targets, None)
            .await;

        assert_eq!(output.documents.len(), 25);
        let max_open = state.max_open_tabs.load(Ordering::SeqCst);
        assert!(max_open <= 4, "{} tabs open at once", max_open);
        assert!(max_open > 2);
    }
}
