//! Kennel-Crawl main entry point
//!
//! This is the command-line interface for the Kennel-Crawl harvester.

use anyhow::Context;
use clap::Parser;
use kennel_crawl::config::{load_config_with_hash, Config, Site};
use kennel_crawl::output::{load_status, print_stats, print_status};
use kennel_crawl::sites::FciExtractor;
use kennel_crawl::state::StateStore;
use kennel_crawl::{Crawler, CrawlerSettings, Extractor, JsonDirSink};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Kennel-Crawl: a resumable breed-nomenclature harvester
///
/// Walks a paginated nomenclature site breadth-first, writing one JSON
/// record per breed. Progress is checkpointed after every page, so an
/// interrupted run picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "kennel-crawl")]
#[command(version)]
#[command(about = "A resumable breed-nomenclature harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Delete the checkpoint and all stored records before crawling
    #[arg(long, conflicts_with = "stats")]
    reset: bool,

    /// Override the configured data directory
    #[arg(long, value_name = "DIR")]
    data_dir: Option<String>,

    /// Show checkpoint and record counts and exit
    #[arg(long)]
    stats: bool,

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

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(data_dir) = cli.data_dir {
        config.output.data_dir = data_dir;
    }

    if cli.stats {
        return handle_stats(&config);
    }

    match config.crawler.site {
        Site::Fci => {
            let extractor = FciExtractor::new().context("Failed to build FCI extractor")?;
            handle_crawl(&config, extractor, cli.reset, cli.quiet).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kennel_crawl=info,warn"),
            1 => EnvFilter::new("kennel_crawl=debug,info"),
            2 => EnvFilter::new("kennel_crawl=trace,debug"),
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

/// Handles the --stats mode: shows checkpoint and sink status
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let output_dir = config.output_dir();
    let store = StateStore::new(&output_dir, &config.crawler.name);
    let sink = JsonDirSink::new(&output_dir);

    let status = load_status(&store, &sink).context("Failed to read crawl status")?;
    print_status(&status);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl<E: Extractor>(
    config: &Config,
    extractor: E,
    reset: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let output_dir = config.output_dir();
    let settings = CrawlerSettings::from_config(config);
    let sink = JsonDirSink::new(&output_dir);

    let mut crawler = Crawler::new(settings, extractor, sink)
        .with_context(|| format!("Failed to initialize crawler {}", config.crawler.name))?;

    if reset {
        tracing::info!("Resetting crawl state and stored records");
        crawler.reset().context("Reset failed")?;
    }

    match crawler.run().await {
        Ok(stats) => {
            if !quiet {
                print_stats(&stats);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e).context("Crawl aborted; rerun to resume from the last checkpoint")
        }
    }
}
