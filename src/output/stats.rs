//! Statistics generation from the index database
//!
//! This module provides functionality for extracting and displaying
//! index statistics from the storage layer.

use crate::storage::{IndexStore, RunRecord};
use crate::Result;

/// Index statistics summary
#[derive(Debug, Clone)]
pub struct IndexStatistics {
    /// Every page row, placeholders included
    pub total_pages: u64,

    /// Pages that have been fetched and indexed
    pub indexed_pages: u64,

    /// Size of the stem vocabulary
    pub terms: u64,

    pub body_postings: u64,
    pub title_postings: u64,

    /// Distinct parent/child edges
    pub total_links: u64,

    /// Most recent crawl run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
pub fn load_statistics(store: &dyn IndexStore) -> Result<IndexStatistics> {
    let counts = store.counts()?;
    let latest_run = store.get_latest_run()?;

    Ok(IndexStatistics {
        total_pages: counts.total_pages,
        indexed_pages: counts.indexed_pages,
        terms: counts.terms,
        body_postings: counts.body_postings,
        title_postings: counts.title_postings,
        total_links: counts.links,
        latest_run,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IndexStatistics) {
    println!("=== Index Statistics ===\n");

    println!("Pages:");
    println!("  Indexed: {}", stats.indexed_pages);
    println!(
        "  Link targets not yet fetched: {}",
        stats.total_pages.saturating_sub(stats.indexed_pages)
    );
    println!();

    println!("Index:");
    println!("  Terms: {}", stats.terms);
    println!("  Body postings: {}", stats.body_postings);
    println!("  Title postings: {}", stats.title_postings);
    println!("  Links: {}", stats.total_links);
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest run #{}:", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Config hash: {}", run.config_hash);
        }
        None => println!("No crawl runs recorded"),
    }
}
