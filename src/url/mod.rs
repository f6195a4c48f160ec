//! URL handling module for Site-Harvest
//!
//! This module provides URL normalization, host extraction, and the filters
//! that decide whether a discovered link is worth crawling.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, is_same_host};
pub use normalize::{has_skipped_extension, normalize_parsed, normalize_url};
