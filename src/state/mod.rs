//! State module for tracking crawl progress
//!
//! This module provides the values that flow through a harvest run.
//!
//! # Components
//!
//! - `FetchOutcome` / `StatusKind`: classification of one page-load attempt
//! - `CrawlFrontier`: the per-site visited set and frontier
//! - `CrawledDocument` / `FailureRecord`: what a site crawl produces per page

mod document;
mod frontier;
mod outcome;

// Re-export main types
pub use document::{CrawledDocument, DocumentMetadata, FailureRecord};
pub use frontier::CrawlFrontier;
pub use outcome::{FetchOutcome, StatusKind};
