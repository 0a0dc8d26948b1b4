//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest gallery harvester.

use clap::Parser;
use std::path::PathBuf;
use sumi_harvest::config::{load_config, load_config_from_env, Config};
use sumi_harvest::crawler::harvest;
use sumi_harvest::storage::RunStatus;
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: a paginated gallery image harvester
///
/// Walks the gallery from its start page, downloading and deduplicating
/// images until the requested count is reached or the pages run out.
/// Settings come from an optional TOML file and `SUMI_HARVEST_*`
/// environment variables.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version)]
#[command(about = "A paginated gallery image harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Number of images to harvest
    #[arg(
        short = 'n',
        long,
        value_parser = clap::value_parser!(u32).range(1..),
        required_unless_present_any = ["dry_run", "stats"]
    )]
    count: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
        }
        None => load_config_from_env(),
    };
    let config = match config {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, cli.count);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(count) = cli.count {
        handle_harvest(config, count).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
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

/// Handles the --dry-run mode: prints the resolved configuration
fn handle_dry_run(config: &Config, count: Option<u32>) {
    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Concurrency limit: {}", config.crawler.concurrency_limit);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Connect timeout: {}s", config.crawler.connect_timeout);
    println!("  Pixel budget: {}", config.crawler.max_image_pixels);
    println!("  JPEG quality: {}", config.crawler.jpeg_quality);
    println!("  Image suffix: {}", config.crawler.image_suffix);
    println!("  Pager class: {}", config.crawler.pager_class);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Images: {}", config.output.image_directory);
    println!("  Database: {}", config.output.database_path);
    println!("  Ledger: {}", config.output.ledger_path);

    println!("\n✓ Configuration is valid");
    if let Some(count) = count {
        println!("✓ Would harvest up to {} images", count);
    }
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use std::path::Path;
    use sumi_harvest::output::{load_statistics, print_statistics};
    use sumi_harvest::storage::open_storage;

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, count: u32) -> anyhow::Result<()> {
    tracing::info!(
        "Harvesting {} images starting at {}",
        count,
        config.crawler.start_url
    );

    match harvest(config, count).await {
        Ok(report) if report.run_status == RunStatus::Failed => {
            tracing::error!(
                "Harvest run {} failed: {} images could not be persisted",
                report.run_id,
                report.totals.persistence_failures
            );
            anyhow::bail!("harvest run {} failed to persist images", report.run_id)
        }
        Ok(report) => {
            tracing::info!(
                "Harvest completed successfully: {} pages processed ({})",
                report.totals.pages_processed,
                report.termination
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
