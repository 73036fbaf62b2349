//! Rift-Crawler main entry point
//!
//! This is the command-line interface for the Rift-Crawler ranked match crawler.

use anyhow::Context;
use clap::Parser;
use rift_crawler::config::{load_config_with_hash, Config};
use rift_crawler::notify::{forward_lines, ChannelNotifier, DEFAULT_CAPACITY};
use rift_crawler::riot::RiotClient;
use rift_crawler::storage;
use rift_crawler::Crawler;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Rift-Crawler: a ranked match crawler
///
/// Rift-Crawler walks outward from a seed match through participants' match
/// histories, keeps ranked solo/duo matches on whitelisted patches played
/// within a tracked tier band, and stores match and timeline statistics.
#[derive(Parser, Debug)]
#[command(name = "rift-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A ranked match crawler", long_about = None)]
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

    /// Validate config and show the effective settings without crawling
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

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries the progress feed.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rift_crawler=info,warn"),
            1 => EnvFilter::new("rift_crawler=debug,info"),
            2 => EnvFilter::new("rift_crawler=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Rift-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Batch cooldown: {}ms", config.crawler.batch_cooldown);
    println!("  Seed match: {}", config.crawler.seed_match_id);
    println!("  Warm start sample: {}", config.crawler.warm_start_sample);

    println!("\nFilter:");
    let tiers: Vec<_> = config
        .filter
        .tier_band
        .iter()
        .map(|t| t.to_db_string())
        .collect();
    println!("  Tier band: {}", tiers.join(", "));
    println!("  Patches: {}", config.filter.patch_whitelist.join(", "));

    println!("\nAPI:");
    println!("  Regional URL: {}", config.api.regional_url);
    println!("  Platform URL: {}", config.api.platform_url);
    println!("  API key variable: {}", config.api.api_key_env);
    println!("  Timeout: {}s", config.api.timeout_secs);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use rift_crawler::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let storage = storage::open_storage(Path::new(&config.output.database_path))
        .context("failed to open database")?;
    let stats = load_statistics(&storage).context("failed to load statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    let api = RiotClient::from_env(&config.api).context("failed to build API client")?;
    let storage = storage::open_storage(Path::new(&config.output.database_path))
        .context("failed to open database")?;

    let notifier = Arc::new(ChannelNotifier::new(DEFAULT_CAPACITY));
    let feed = tokio::spawn(forward_lines(notifier.subscribe(), std::io::stdout()));

    let crawler = Crawler::new(
        &config,
        config_hash,
        Arc::new(api),
        storage::shared(storage),
        notifier.clone(),
    )
    .context("failed to initialize crawler")?;

    let handle = crawler.handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling crawl");
            handle.cancel();
        }
    });

    let result = crawler.crawl().await;

    // Close the feed so the forwarder drains and exits
    interrupt.abort();
    let _ = interrupt.await;
    drop(crawler);
    drop(notifier);
    let _ = feed.await;

    match result.context("crawl failed")? {
        Some(summary) => tracing::info!(
            "Crawl finished: {} batches, {} ingested, {} rejected, {} not found, {} rate-limit retries, {} failed batches{}",
            summary.batches,
            summary.ingested,
            summary.rejected,
            summary.missing,
            summary.rate_limit_retries,
            summary.failed_batches,
            if summary.cancelled { " (cancelled)" } else { "" }
        ),
        None => tracing::warn!("A crawl was already running"),
    }

    Ok(())
}
