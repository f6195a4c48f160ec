//! Site-Harvest: a concurrent company-website harvester
//!
//! This crate turns a handful of company websites into a bounded, deduplicated
//! corpus of page text. Each site is crawled breadth-first in waves through a
//! shared headless browser, failed pages are classified and retried, and the
//! resulting documents are split into overlapping chunks ready for indexing.

pub mod browser;
pub mod chunker;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod targets;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Crawl of {company} failed: {message}")]
    Site { company: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised by a browser engine
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to create browsing context: {0}")]
    Context(String),

    #[error("Failed to open tab: {0}")]
    Tab(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Navigation timed out")]
    Timeout,

    #[error("Failed to capture page content: {0}")]
    Content(String),

    #[error("Browser session is closed")]
    Closed,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Site-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for browser operations
pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use chunker::{Chunker, TextChunk};
pub use config::Config;
pub use crawler::{crawl_site, fetch_page, Coordinator, RunOutput, SiteCrawl};
pub use output::{RunStats, SiteStats};
pub use state::{CrawledDocument, DocumentMetadata, FailureRecord, FetchOutcome, StatusKind};
pub use targets::CrawlTarget;
pub use url::{extract_domain, normalize_url};
