//! seo-crawler main entry point
//!
//! This is the command-line interface for the seo-crawler site crawler.

use anyhow::Context;
use clap::Parser;
use seo_crawler::config::{load_config_with_hash, Config, CrawlSettings};
use seo_crawler::output::{print_statistics, write_report, CrawlStatistics, OutputFormat};
use seo_crawler::url::validate_seed;
use seo_crawler::Crawler;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// seo-crawler: a polite site crawler for SEO audits
///
/// Crawls a single site breadth-first from a seed URL, respecting robots.txt
/// and a session-wide request rate, and writes a report of every page,
/// broken link, redirect and external link it found.
#[derive(Parser, Debug)]
#[command(name = "seo-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite site crawler for SEO audits", long_about = None)]
struct Cli {
    /// Absolute http(s) URL to start crawling from
    #[arg(value_name = "SEED")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of pages to fetch, seed included
    #[arg(long)]
    max_pages: Option<usize>,

    /// Maximum link depth from the seed
    #[arg(long)]
    max_depth: Option<u32>,

    /// Session-wide request ceiling
    #[arg(long)]
    requests_per_second: Option<f64>,

    /// Number of concurrent fetch workers
    #[arg(long)]
    workers: Option<usize>,

    /// Report format (markdown or json)
    #[arg(short, long, default_value = "markdown")]
    format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Validate the seed and configuration without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    let settings = apply_overrides(config.settings(), &cli);
    settings.validate().context("Invalid crawl settings")?;
    let seed = validate_seed(&cli.seed).with_context(|| format!("Invalid seed URL '{}'", cli.seed))?;

    if cli.dry_run {
        handle_dry_run(&seed, &settings);
        return Ok(());
    }

    handle_crawl(&cli, seed.as_str(), settings, config_hash.as_deref()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so a report written to stdout stays clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seo_crawler=info,warn"),
            1 => EnvFilter::new("seo_crawler=debug,info"),
            2 => EnvFilter::new("seo_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line limits take precedence over the configuration file
fn apply_overrides(mut settings: CrawlSettings, cli: &Cli) -> CrawlSettings {
    if let Some(max_pages) = cli.max_pages {
        settings.max_pages = max_pages;
    }
    if let Some(max_depth) = cli.max_depth {
        settings.max_depth = max_depth;
    }
    if let Some(rps) = cli.requests_per_second {
        settings.requests_per_second = rps;
    }
    if let Some(workers) = cli.workers {
        settings.workers = workers;
    }
    settings
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(seed: &url::Url, settings: &CrawlSettings) {
    println!("=== seo-crawler Dry Run ===\n");

    println!("Seed: {}", seed);

    println!("\nCrawler Configuration:");
    println!("  Max pages: {}", settings.max_pages);
    println!("  Max depth: {}", settings.max_depth);
    println!("  Requests per second: {}", settings.requests_per_second);
    println!("  Workers: {}", settings.workers);
    println!("  Request timeout: {:?}", settings.request_timeout);
    println!("  Max redirects: {}", settings.max_redirects);

    println!("\nUser Agent:");
    println!("  {}", settings.user_agent_header());

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    cli: &Cli,
    seed: &str,
    settings: CrawlSettings,
    config_hash: Option<&str>,
) -> anyhow::Result<()> {
    let crawler = Crawler::with_http_fetcher(settings).context("Failed to build HTTP client")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl and writing partial report");
            on_interrupt.cancel();
        }
    });

    let session = crawler
        .run_with_cancellation(seed, cancel)
        .await
        .context("Crawl failed")?;

    write_report(&session, cli.format, cli.output.as_deref(), config_hash)
        .context("Failed to write report")?;

    // Statistics only when stdout is not carrying the report
    if cli.output.is_some() && !cli.quiet {
        print_statistics(&CrawlStatistics::from_session(&session));
    }

    Ok(())
}
