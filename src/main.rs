//! Site-Harvest main entry point
//!
//! This is the command-line interface for the Site-Harvest company website
//! crawler.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use site_harvest::browser::init_environment;
use site_harvest::config::{load_config_with_hash, BrowserEngine, Config};
use site_harvest::crawler::{crawl, Progress};
use site_harvest::output::{generate_markdown_summary, print_statistics, write_jsonl};
use site_harvest::Chunker;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Site-Harvest: turns company websites into chunked text corpora
///
/// Site-Harvest crawls a bounded number of pages per company website with a
/// shared headless browser, classifies every failed page, and writes the
/// page text as overlapping chunks ready for indexing.
#[derive(Parser, Debug)]
#[command(name = "site-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent company website harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Override the browser engine from the configuration
    #[arg(long, value_enum)]
    engine: Option<EngineArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineArg {
    Chrome,
    Http,
}

impl From<EngineArg> for BrowserEngine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Chrome => BrowserEngine::Chrome,
            EngineArg::Http => BrowserEngine::Http,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(engine) = cli.engine {
        config.browser.engine = engine.into();
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvest=info,warn"),
            1 => EnvFilter::new("site_harvest=debug,info"),
            2 => EnvFilter::new("site_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Site-Harvest Dry Run ===\n");

    let crawler = &config.crawler;
    println!("Crawler Configuration:");
    println!("  Max pages per site: {}", crawler.max_pages);
    println!("  Concurrency per site: {}", crawler.concurrency);
    println!("  Sites per batch: {}", crawler.batch_size);
    println!("  Attempts per page: {}", crawler.max_attempts);
    println!("  Page timeout: {}s", crawler.page_timeout_secs);
    println!("  Minimum words: {}", crawler.min_words);

    println!("\nBrowser:");
    println!("  Engine: {:?}", config.browser.engine);
    println!("  Headless: {}", config.browser.headless);
    if let Some(executable) = &config.browser.executable {
        println!("  Executable: {}", executable);
    }

    println!("\nChunker:");
    println!("  Chunk size: {}", config.chunker.chunk_size);
    println!("  Chunk overlap: {}", config.chunker.chunk_overlap);

    println!("\nOutput:");
    println!("  Chunks: {}", config.output.chunks_path);
    println!("  Failures: {}", config.output.failures_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nTargets ({}):", config.targets.len());
    for target in &config.targets {
        println!("  - {} ({})", target.company, target.url);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would visit at most {} pages in {} batch(es)",
        config.targets.len() * crawler.max_pages,
        config.targets.len().div_ceil(crawler.batch_size.max(1))
    );
}

/// Handles the main harvest: crawl, chunk, export
async fn handle_harvest(config: &Config) -> anyhow::Result<()> {
    // One-time setup before any crawl begins
    init_environment(&config.browser);
    if config.browser.engine == BrowserEngine::Http {
        tracing::info!("Using the plain HTTP engine, pages are not rendered");
    }

    let progress = |p: Progress| {
        tracing::info!(
            "Progress: {}/{} pages, batch {}/{}",
            p.pages_visited,
            p.expected_pages,
            p.batches_done,
            p.batches_total
        );
    };

    let output = crawl(config, Some(&progress))
        .await
        .context("harvest aborted")?;

    let chunks = Chunker::new(config.chunker.clone()).chunk(&output.documents);
    tracing::info!(
        "{} documents split into {} chunks",
        output.documents.len(),
        chunks.len()
    );

    write_jsonl(Path::new(&config.output.chunks_path), &chunks)
        .with_context(|| format!("failed to write {}", config.output.chunks_path))?;
    write_jsonl(Path::new(&config.output.failures_path), &output.failures)
        .with_context(|| format!("failed to write {}", config.output.failures_path))?;
    generate_markdown_summary(
        &output.stats,
        &output.failures,
        Path::new(&config.output.summary_path),
    )
    .with_context(|| format!("failed to write {}", config.output.summary_path))?;

    print_statistics(&output.stats);
    println!("\n✓ Chunks written to: {}", config.output.chunks_path);
    println!("✓ Summary written to: {}", config.output.summary_path);

    Ok(())
}
