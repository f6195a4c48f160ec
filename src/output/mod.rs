//! Output module for harvest results
//!
//! This module handles:
//! - Aggregating per-site and run-wide statistics
//! - Exporting chunks and failure records as JSON Lines
//! - Generating markdown summaries of a run

mod jsonl;
mod markdown;
pub mod stats;

pub use jsonl::write_jsonl;
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, RunStats, SiteStats};
