//! Spindex main entry point
//!
//! This is the command-line interface for crawling, searching and reporting.

use anyhow::{Context, Result};
use clap::Parser;
use spindex::config::{load_config_with_hash, Config};
use spindex::crawler::run_crawl;
use spindex::output::{
    enrich_hits, generate_report, load_statistics, paginate, print_results, print_statistics,
    Paginated,
};
use spindex::storage::{lock_store, open_shared, SharedStore};
use spindex::text::normalizer_for;
use spindex::{Normalizer, QueryEngine, SearchResults};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Spindex: a polite site crawler with a positional search index
///
/// Without a mode flag, crawls the configured site breadth-first, indexes
/// every page, and writes the spider report.
#[derive(Parser, Debug)]
#[command(name = "spindex")]
#[command(version)]
#[command(about = "Crawl a site, index it, and search it", long_about = None)]
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

    /// Search the existing index and exit
    #[arg(long, value_name = "QUERY", conflicts_with_all = ["similar", "stats", "report"])]
    query: Option<String>,

    /// Result page to show for --query or --similar (1-based)
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Find pages similar to an indexed URL and exit
    #[arg(long, value_name = "URL", conflicts_with_all = ["query", "stats", "report"])]
    similar: Option<String>,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["query", "similar", "report"])]
    stats: bool,

    /// Regenerate the spider report from existing data and exit
    #[arg(long, conflicts_with_all = ["query", "similar", "stats"])]
    report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::debug!("Configuration loaded (hash: {})", config_hash);

    if let Some(query) = &cli.query {
        handle_search(&config, query, cli.page)?;
    } else if let Some(url) = &cli.similar {
        handle_similar(&config, url, cli.page)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.report {
        handle_report(&config)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("spindex=info,warn"),
            1 => EnvFilter::new("spindex=debug,info"),
            2 => EnvFilter::new("spindex=trace,debug"),
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

fn open_index(config: &Config) -> Result<(SharedStore, Arc<Normalizer>)> {
    let path = Path::new(&config.index.database_path);
    let store = open_shared(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let normalizer = normalizer_for(&config.index).context("Failed to load stopwords")?;
    Ok((store, Arc::new(normalizer)))
}

/// Enriches and prints one page of ranked results
fn show_results(
    config: &Config,
    store: &SharedStore,
    normalizer: &Normalizer,
    results: &SearchResults,
    page: usize,
) -> Result<()> {
    if let Some(notice) = &results.notice {
        println!("{}", notice);
        return Ok(());
    }

    let current = paginate(&results.hits, page, config.search.page_size);

    let entries = {
        let guard = lock_store(store)?;
        enrich_hits(&*guard, &current.items, normalizer.stopwords())?
    };

    let shown = Paginated {
        items: entries,
        page: current.page,
        per_page: current.per_page,
        total_pages: current.total_pages,
    };
    print_results(&shown);
    Ok(())
}

/// Handles the --query mode
fn handle_search(config: &Config, query: &str, page: usize) -> Result<()> {
    let (store, normalizer) = open_index(config)?;
    let engine = QueryEngine::new(store.clone(), normalizer.clone(), &config.search);

    let results = engine.search(query)?;
    tracing::info!("{} results for {:?}", results.hits.len(), query);
    show_results(config, &store, &normalizer, &results, page)
}

/// Handles the --similar mode
fn handle_similar(config: &Config, url: &str, page: usize) -> Result<()> {
    let (store, normalizer) = open_index(config)?;
    let engine = QueryEngine::new(store.clone(), normalizer.clone(), &config.search);

    let results = engine.find_similar(url);
    show_results(config, &store, &normalizer, &results, page)
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.index.database_path);

    let (store, _) = open_index(config)?;
    let stats = {
        let guard = lock_store(&store)?;
        load_statistics(&*guard)?
    };
    print_statistics(&stats);

    Ok(())
}

/// Handles the --report mode: writes the spider report
fn handle_report(config: &Config) -> Result<()> {
    let (store, normalizer) = open_index(config)?;
    write_report(config, &store, &normalizer)?;
    println!("Report written to: {}", config.output.report_path);
    Ok(())
}

fn write_report(config: &Config, store: &SharedStore, normalizer: &Normalizer) -> Result<()> {
    let guard = lock_store(store)?;
    generate_report(
        &*guard,
        normalizer.stopwords(),
        Path::new(&config.output.report_path),
    )
    .with_context(|| format!("Failed to write {}", config.output.report_path))?;
    Ok(())
}

/// Handles the main crawl operation, then writes the report
async fn handle_crawl(config: Config, config_hash: &str) -> Result<()> {
    tracing::info!(
        "Crawling {} (max {} pages, {}ms between requests)",
        config.crawler.seed_url,
        config.crawler.max_pages,
        config.crawler.politeness_delay
    );

    let summary = match run_crawl(config.clone(), config_hash).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if summary.cancelled {
        tracing::warn!("Crawl was interrupted; the report covers pages indexed so far");
    }

    let (store, normalizer) = open_index(&config)?;
    write_report(&config, &store, &normalizer)
}
