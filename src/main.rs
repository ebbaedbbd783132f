//! Tag-Harvest main entry point
//!
//! This is the command-line interface for the Tag-Harvest crawler.

use anyhow::{anyhow, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use tag_harvest::config::{load_config_with_hash, Config};
use tag_harvest::crawler::run_crawl;
use tag_harvest::output::{print_statistics, write_report};
use tag_harvest::storage::{
    load_all, CategoryStore, CheckpointStore, JsonCategoryStore, JsonCheckpointStore,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tag-Harvest: a resumable tag-indexed article crawler
///
/// Tag-Harvest walks tag identifiers of a paginated article API, collects
/// every article URL exactly once and keeps per-category statistics. It can
/// be stopped at any moment and resumes where it left off.
#[derive(Parser, Debug)]
#[command(name = "tag-harvest")]
#[command(version)]
#[command(about = "A resumable tag-indexed article crawler", long_about = None)]
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

    /// Resume an interrupted crawl (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Discard the checkpoint and start from the first key (corpus and stats are kept)
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show where the crawl would resume without crawling
    #[arg(long, conflicts_with_all = ["stats", "report"])]
    dry_run: bool,

    /// Show statistics from the state files and exit
    #[arg(long, conflicts_with_all = ["dry_run", "report"])]
    stats: bool,

    /// Regenerate the category report from the stats file and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;

    // Held until exit so the file writer flushes
    let _log_guard = setup_logging(cli.verbose, cli.quiet, config.output.log_path.as_deref())?;

    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.report {
        handle_report(&config)?;
    } else {
        handle_crawl(&config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Console output always; a plain-text copy goes to `log_path` when set.
fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_path: Option<&Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tag_harvest=info,warn"),
            1 => EnvFilter::new("tag_harvest=debug,info"),
            2 => EnvFilter::new("tag_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let (file_layer, guard) = match log_path {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("log-path {} has no file name", path.display()))?;

            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Handles the --dry-run mode: validates config and shows the resume point
fn handle_dry_run(config: &Config) {
    println!("=== Tag-Harvest Dry Run ===\n");

    println!("API:");
    println!("  Endpoint: {}", config.api.endpoint);
    println!("  Article base URL: {}", config.api.article_base_url);
    println!("  Page size: {}", config.api.page_size);
    println!("  Request timeout: {}s", config.api.request_timeout);
    println!("  User agent: {}", config.api.user_agent);

    println!("\nCrawler:");
    println!(
        "  Key space: [{}, {})",
        config.crawler.first_key, config.crawler.max_key
    );
    println!("  Request delay: {}ms", config.crawler.request_delay);
    println!(
        "  Error backoff: {:?}, {}ms up to {}ms, no retry limit",
        config.crawler.backoff,
        config.crawler.error_delay,
        config.crawler.max_error_delay()
    );

    println!("\nOutput:");
    println!("  Checkpoint: {}", config.output.state_path.display());
    println!("  Corpus: {}", config.output.corpus_path.display());
    println!("  Category stats: {}", config.output.stats_path.display());
    println!("  Report: {}", config.output.report_path.display());
    if let Some(log_path) = &config.output.log_path {
        println!("  Log: {}", log_path.display());
    }

    let state = JsonCheckpointStore::new(&config.output.state_path).load();
    let resume_key = state.resume_key(config.crawler.first_key);
    let resume_page = state.key_state(resume_key).start_page().unwrap_or(1);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would resume at key {} page {} ({} keys already completed)",
        resume_key,
        resume_page,
        state.completed_keys.len()
    );
}

/// Handles the --stats mode: shows statistics from the state files
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let state = JsonCheckpointStore::new(&config.output.state_path).load();
    let stats = JsonCategoryStore::new(&config.output.stats_path).load();
    let corpus = load_all(&config.output.corpus_path)?;

    print_statistics(&state, &stats, corpus.len(), config.crawler.first_key, 20);
    Ok(())
}

/// Handles the --report mode: regenerates the category report
fn handle_report(config: &Config) -> anyhow::Result<()> {
    let stats = JsonCategoryStore::new(&config.output.stats_path).load();

    if write_report(&stats, &config.output.report_path)? {
        println!(
            "✓ Report exported to: {}",
            config.output.report_path.display()
        );
    } else {
        println!("No category statistics yet, nothing to report");
    }
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (checkpoint will be discarded)");
    } else {
        tracing::info!("Starting crawl (will resume if a checkpoint exists)");
    }

    match run_crawl(config, fresh).await {
        Ok(outcome) => {
            tracing::info!(
                "Crawl completed: {} keys completed, {} pages, {} new articles",
                outcome.keys_completed,
                outcome.pages_processed,
                outcome.novel_items
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
