//! Markdown summary generation
//!
//! This module generates a human-readable report of a harvest run: totals,
//! a per-company table, the status breakdown and the failed pages.

use crate::output::RunStats;
use crate::state::{FailureRecord, StatusKind};
use crate::Result;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Failed pages listed per company before the rest are summarized
const MAX_FAILURES_PER_COMPANY: usize = 20;

/// Writes the markdown summary of a run to `output_path`
pub fn generate_markdown_summary(
    stats: &RunStats,
    failures: &[FailureRecord],
    output_path: &Path,
) -> Result<()> {
    let markdown = format_markdown_summary(stats, failures);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats run statistics and failures as markdown
pub fn format_markdown_summary(stats: &RunStats, failures: &[FailureRecord]) -> String {
    let mut md = String::new();

    md.push_str("# Site Harvest Summary\n\n");

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **Companies**: {}\n",
        stats.company_stats.len()
    ));
    md.push_str(&format!(
        "- **Pages Visited**: {}\n",
        stats.total_pages_visited
    ));
    md.push_str(&format!("- **Pages Scraped**: {}\n", stats.pages_scraped));
    md.push_str(&format!("- **Pages Failed**: {}\n", stats.pages_failed));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n", stats.success_rate()));
    md.push_str(&format!(
        "- **Elapsed**: {:.1} seconds\n\n",
        stats.elapsed_secs
    ));

    // Per-company table
    if !stats.company_stats.is_empty() {
        md.push_str("## Companies\n\n");
        md.push_str("| Company | Visited | Scraped | Failed | Seconds |\n");
        md.push_str("|---------|---------|---------|--------|---------|\n");
        for (company, site) in &stats.company_stats {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {:.1} |\n",
                escape_cell(company),
                site.pages_visited,
                site.pages_scraped,
                site.pages_failed,
                site.elapsed_secs
            ));
        }
        md.push('\n');
    }

    // Status breakdown, every kind listed
    md.push_str("## Status Breakdown\n\n");
    md.push_str("| Status | Count |\n");
    md.push_str("|--------|-------|\n");
    for status in StatusKind::ALL {
        md.push_str(&format!("| {} | {} |\n", status, stats.status_count(status)));
    }
    md.push('\n');

    // Domains
    if !stats.pages_per_domain.is_empty() {
        md.push_str("## Pages per Domain\n\n");
        for (domain, count) in &stats.pages_per_domain {
            md.push_str(&format!("- {}: {}\n", domain, count));
        }
        md.push('\n');
    }

    // Failed pages, grouped by company
    if !failures.is_empty() {
        md.push_str("## Failed Pages\n\n");

        let mut by_company: BTreeMap<&str, Vec<&FailureRecord>> = BTreeMap::new();
        for failure in failures {
            by_company
                .entry(failure.company_name.as_str())
                .or_default()
                .push(failure);
        }

        for (company, records) in by_company {
            md.push_str(&format!("### {}\n\n", company));
            md.push_str("| URL | Status | Detail |\n");
            md.push_str("|-----|--------|--------|\n");
            for record in records.iter().take(MAX_FAILURES_PER_COMPANY) {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    escape_cell(&record.url),
                    record.status,
                    escape_cell(&record.error_detail)
                ));
            }
            if records.len() > MAX_FAILURES_PER_COMPANY {
                md.push_str(&format!(
                    "\n... and {} more\n",
                    records.len() - MAX_FAILURES_PER_COMPANY
                ));
            }
            md.push('\n');
        }
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
