//! Result enrichment and pagination
//!
//! The query engine returns bare `(page id, score)` pairs; this module looks
//! up what a reader needs to see for each hit and slices the list into pages.

use crate::output::report::REPORT_KEYWORDS;
use crate::search::SearchHit;
use crate::storage::{IndexStore, Keyword, StorageResult};
use std::collections::HashSet;

/// A ranked hit with everything needed to display it
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    pub url: String,
    pub title: String,
    pub score: f64,
    pub last_modified: Option<String>,
    pub size: u64,
    pub keywords: Vec<Keyword>,
    pub parent_links: Vec<String>,
    pub child_links: Vec<String>,
}

/// One page of a paginated list
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Paginated<T> {
    /// 1-based overall rank of the first item on this page
    pub fn first_rank(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.per_page).saturating_add(1)
    }
}

/// Looks up display data for each hit, preserving rank order
///
/// Hits whose page row has vanished are dropped.
pub fn enrich_hits(
    store: &dyn IndexStore,
    hits: &[SearchHit],
    stopwords: &HashSet<String>,
) -> StorageResult<Vec<ResultEntry>> {
    let mut entries = Vec::with_capacity(hits.len());

    for hit in hits {
        let Some(page) = store.get_page(hit.page_id)? else {
            tracing::debug!("Ranked page {} has no page row", hit.page_id);
            continue;
        };

        entries.push(ResultEntry {
            keywords: store.top_keywords(page.id, REPORT_KEYWORDS, stopwords)?,
            parent_links: store.parent_urls(page.id)?,
            child_links: store.child_urls(page.id)?,
            url: page.url,
            title: page.title.unwrap_or_default(),
            score: hit.score,
            last_modified: page.last_modified.filter(|lm| !lm.is_empty()),
            size: page.size.unwrap_or(0),
        });
    }

    Ok(entries)
}

/// Returns page `page` (1-based) of `items`, `per_page` at a time
///
/// Page numbers below 1 are served as page 1; pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Paginated<T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_pages = (items.len() + per_page - 1) / per_page;

    let start = (page - 1).saturating_mul(per_page).min(items.len());
    let end = (start + per_page).min(items.len());

    Paginated {
        items: items[start..end].to_vec(),
        page,
        per_page,
        total_pages,
    }
}

/// Prints one page of results to stdout
pub fn print_results(results: &Paginated<ResultEntry>) {
    let first_rank = results.first_rank();
    for (offset, entry) in results.items.iter().enumerate() {
        println!("{:>3}. {:.4}  {}", first_rank + offset, entry.score, entry.title);
        println!("     {}", entry.url);
        println!(
            "     {}, {} bytes",
            entry.last_modified.as_deref().unwrap_or("N/A"),
            entry.size
        );
        if !entry.keywords.is_empty() {
            let keywords: Vec<String> = entry.keywords.iter().map(|k| k.to_string()).collect();
            println!("     Keywords: {}", keywords.join("; "));
        }
        for parent in &entry.parent_links {
            println!("     <- {}", parent);
        }
        for child in &entry.child_links {
            println!("     -> {}", child);
        }
        println!();
    }
    println!("Page {} of {}", results.page, results.total_pages);
}
