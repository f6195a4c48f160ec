//! Crawl statistics
//!
//! `SiteStats` is produced by one site crawl; `RunStats` is the sum of every
//! site's stats plus the per-company breakdown. Both are plain values: the
//! orchestrator builds `RunStats` only after each site crawl has returned.

use crate::state::StatusKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters for one company's crawl
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteStats {
    /// Pages dispatched for fetching, whatever their outcome
    pub pages_visited: usize,

    /// Pages that produced a document
    pub pages_scraped: usize,

    /// Pages whose final attempt was not a success
    pub pages_failed: usize,

    /// Successful pages per host
    pub pages_per_domain: BTreeMap<String, usize>,

    /// Final outcomes per status kind
    pub pages_per_status: BTreeMap<StatusKind, usize>,

    /// Wall time of the crawl in seconds
    pub elapsed_secs: f64,
}

impl SiteStats {
    /// Records a successful page served from `domain`
    pub fn record_success(&mut self, domain: &str) {
        self.pages_scraped += 1;
        *self.pages_per_domain.entry(domain.to_string()).or_insert(0) += 1;
        *self.pages_per_status.entry(StatusKind::Success).or_insert(0) += 1;
    }

    /// Records a page that ended with a non-success status
    pub fn record_failure(&mut self, status: StatusKind) {
        self.pages_failed += 1;
        *self.pages_per_status.entry(status).or_insert(0) += 1;
    }

    /// Adds another site's counters into this one
    pub fn absorb(&mut self, other: &SiteStats) {
        self.pages_visited += other.pages_visited;
        self.pages_scraped += other.pages_scraped;
        self.pages_failed += other.pages_failed;
        merge_counts(&mut self.pages_per_domain, &other.pages_per_domain);
        merge_counts(&mut self.pages_per_status, &other.pages_per_status);
        self.elapsed_secs += other.elapsed_secs;
    }

    pub fn status_count(&self, status: StatusKind) -> usize {
        self.pages_per_status.get(&status).copied().unwrap_or(0)
    }
}

/// Run-wide statistics across every company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_pages_visited: usize,
    pub pages_scraped: usize,
    pub pages_failed: usize,
    pub pages_per_domain: BTreeMap<String, usize>,
    pub pages_per_status: BTreeMap<StatusKind, usize>,

    /// Each company's own stats, keyed by company name
    pub company_stats: BTreeMap<String, SiteStats>,

    /// Wall time of the whole run in seconds
    pub elapsed_secs: f64,
}

impl RunStats {
    /// Merges a finished site crawl into the run totals
    ///
    /// A company name seen twice has its stats summed under that name, so
    /// the run totals always equal the sum over `company_stats`.
    pub fn merge_site(&mut self, company: &str, site: &SiteStats) {
        self.total_pages_visited += site.pages_visited;
        self.pages_scraped += site.pages_scraped;
        self.pages_failed += site.pages_failed;
        merge_counts(&mut self.pages_per_domain, &site.pages_per_domain);
        merge_counts(&mut self.pages_per_status, &site.pages_per_status);

        self.company_stats
            .entry(company.to_string())
            .or_default()
            .absorb(site);
    }

    /// Percentage of visited pages that produced a document
    pub fn success_rate(&self) -> f64 {
        if self.total_pages_visited == 0 {
            0.0
        } else {
            self.pages_scraped as f64 / self.total_pages_visited as f64 * 100.0
        }
    }

    pub fn status_count(&self, status: StatusKind) -> usize {
        self.pages_per_status.get(&status).copied().unwrap_or(0)
    }
}

fn merge_counts<K: Ord + Clone>(into: &mut BTreeMap<K, usize>, from: &BTreeMap<K, usize>) {
    for (key, count) in from {
        *into.entry(key.clone()).or_insert(0) += count;
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Companies crawled: {}", stats.company_stats.len());
    println!("  Pages visited: {}", stats.total_pages_visited);
    println!("  Pages scraped: {}", stats.pages_scraped);
    println!("  Pages failed: {}", stats.pages_failed);
    println!("  Elapsed: {:.1}s", stats.elapsed_secs);
    println!();

    if !stats.company_stats.is_empty() {
        println!("Per Company:");
        for (company, site) in &stats.company_stats {
            println!(
                "  {}: {} visited, {} scraped, {} failed ({:.1}s)",
                company, site.pages_visited, site.pages_scraped, site.pages_failed, site.elapsed_secs
            );
        }
        println!();
    }

    if !stats.pages_per_status.is_empty() {
        println!("Pages by Status:");
        let mut status_counts: Vec<_> = stats.pages_per_status.iter().collect();
        status_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (status, count) in status_counts {
            let percentage = if stats.total_pages_visited > 0 {
                (*count as f64 / stats.total_pages_visited as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", status, count, percentage);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages scraped)",
        stats.success_rate(),
        stats.pages_scraped,
        stats.total_pages_visited
    );
}
