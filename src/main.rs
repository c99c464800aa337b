//! App-Reviews main entry point
//!
//! This is the command-line interface for fetching and exporting App Store reviews.
//!
//! ```text
//! app-reviews 639881495 > imgur_reviews.tsv
//! app-reviews 639881495 --format words
//! ```

use anyhow::Context;
use app_reviews::config::{load_config, validate, Config, OutputFormat};
use app_reviews::fetcher::{build_http_client, ReviewFetcher, UserAgentPool};
use app_reviews::output::render;
use app_reviews::ReviewFeed;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// App-Reviews: fetch every page of an app's App Store reviews
///
/// Pages are requested concurrently until the feed runs out, then written to
/// stdout as tab-separated rows or as a word frequency report.
#[derive(Parser, Debug)]
#[command(name = "app-reviews")]
#[command(version)]
#[command(about = "Fetch and export App Store customer reviews", long_about = None)]
struct Cli {
    /// Numeric App Store identifier of the app
    #[arg(value_name = "APP_ID")]
    app_id: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format (overrides the configuration file)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Drop reviews rated strictly above N (0 keeps everything)
    #[arg(long, value_name = "N")]
    filter_review: Option<u8>,

    /// Maximum concurrent page requests (overrides the configuration file)
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Wait for in-flight page requests once the feed is exhausted
    #[arg(long)]
    settle: bool,

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

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    let fetcher = create_fetcher(&config)?;
    let pages: Vec<ReviewFeed> = fetcher.fetch_all(&cli.app_id).await;

    if pages.is_empty() {
        tracing::warn!("No review pages fetched for app {}", cli.app_id);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render(&pages, &config.output, &mut out).context("Failed to write output")?;

    Ok(())
}

/// Builds the fetcher from settings already checked by `build_config`
fn create_fetcher(config: &Config) -> anyhow::Result<ReviewFetcher> {
    let client = build_http_client(&config.transport).context("Failed to build HTTP client")?;
    Ok(ReviewFetcher::with_client(
        client,
        config.fetcher.clone(),
        UserAgentPool::from_config(&config.user_agent),
    ))
}

/// Loads the configuration file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(filter) = cli.filter_review {
        config.output.filter_review = filter;
    }
    if let Some(concurrency) = cli.concurrency {
        config.fetcher.concurrency = concurrency;
    }
    if cli.settle {
        config.fetcher.settle_in_flight = true;
    }

    validate(&config).context("Invalid settings")?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so they never mix with the exported data on stdout.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("app_reviews=info,warn"),
            1 => EnvFilter::new("app_reviews=debug,info"),
            2 => EnvFilter::new("app_reviews=trace,debug"),
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
