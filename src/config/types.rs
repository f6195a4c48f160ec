use crate::targets::CrawlTarget;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Site-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerSettings,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub chunker: ChunkerSettings,
    pub output: OutputConfig,
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetEntry>,
}

impl Config {
    /// Returns the configured targets as crawl inputs, in file order
    pub fn crawl_targets(&self) -> Vec<CrawlTarget> {
        self.targets
            .iter()
            .map(|t| CrawlTarget::new(t.company.clone(), t.url.clone()))
            .collect()
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerSettings {
    /// Page budget per site
    pub max_pages: usize,

    /// Maximum in-flight page fetches per site
    pub concurrency: usize,

    /// Number of sites crawled concurrently by the orchestrator
    pub batch_size: usize,

    /// Attempts per page before the last outcome becomes final
    pub max_attempts: u32,

    /// Navigation timeout (seconds)
    pub page_timeout_secs: u64,

    /// Delay after navigation for client-rendered content (milliseconds)
    pub settle_delay_ms: u64,

    /// Pause between two attempts on the same page (milliseconds)
    pub retry_delay_ms: u64,

    /// Pages with fewer words are classified as too short
    pub min_words: usize,

    /// Anchors inspected per page during link extraction
    pub max_links_per_page: usize,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            max_pages: 20,
            concurrency: 10,
            batch_size: 3,
            max_attempts: 2,
            page_timeout_secs: 30,
            settle_delay_ms: 500,
            retry_delay_ms: 1000,
            min_words: 50,
            max_links_per_page: 100,
        }
    }
}

impl CrawlerSettings {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Number of URLs taken from the frontier per wave
    pub fn wave_size(&self) -> usize {
        self.concurrency.max(1) * 2
    }
}

/// Which engine loads pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    /// Headless Chrome over the DevTools protocol
    Chrome,
    /// Plain HTTP fetches, no script execution
    Http,
}

/// Browser configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserSettings {
    pub engine: BrowserEngine,

    /// Run Chrome without a visible window
    pub headless: bool,

    /// Explicit path to the Chrome/Chromium binary
    pub executable: Option<String>,

    /// User agent presented by every tab
    pub user_agent: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            engine: BrowserEngine::Chrome,
            headless: true,
            executable: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ChunkerSettings {
    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkerSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// JSON Lines file receiving the text chunks
    pub chunks_path: String,

    /// JSON Lines file receiving the failure records
    pub failures_path: String,

    /// Markdown run summary
    pub summary_path: String,
}

/// One company website to harvest
#[derive(Debug, Clone, Deserialize)]
pub struct TargetEntry {
    /// Company name, used as the filterable facet downstream
    pub company: String,

    /// Root URL of the company website
    pub url: String,
}
