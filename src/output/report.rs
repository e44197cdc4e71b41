//! Plain-text spider report
//!
//! One block per indexed page with its metadata, top keywords and link
//! neighbourhood, blocks separated by a hyphen rule.

use crate::storage::{IndexStore, PageRecord, StorageResult};
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const BLOCK_SEPARATOR: &str = "\n----------------\n\n";

/// Number of keywords listed per page
pub const REPORT_KEYWORDS: usize = 5;

/// Writes the spider report for every indexed page to `output_path`
///
/// # Returns
///
/// The number of page blocks written
pub fn generate_report(
    store: &dyn IndexStore,
    stopwords: &HashSet<String>,
    output_path: &Path,
) -> crate::Result<usize> {
    let pages = store.indexed_pages()?;
    let report = format_pages(store, &pages, stopwords)?;

    let mut file = File::create(output_path)?;
    file.write_all(report.as_bytes())?;

    tracing::info!(
        "Wrote report for {} pages to {}",
        pages.len(),
        output_path.display()
    );
    Ok(pages.len())
}

/// Formats the spider report for every indexed page
pub fn format_report(store: &dyn IndexStore, stopwords: &HashSet<String>) -> StorageResult<String> {
    let pages = store.indexed_pages()?;
    format_pages(store, &pages, stopwords)
}

fn format_pages(
    store: &dyn IndexStore,
    pages: &[PageRecord],
    stopwords: &HashSet<String>,
) -> StorageResult<String> {
    let blocks = pages
        .iter()
        .map(|page| format_block(store, page, stopwords))
        .collect::<StorageResult<Vec<_>>>()?;
    Ok(blocks.join(BLOCK_SEPARATOR))
}

fn format_block(
    store: &dyn IndexStore,
    page: &PageRecord,
    stopwords: &HashSet<String>,
) -> StorageResult<String> {
    let keywords = store.top_keywords(page.id, REPORT_KEYWORDS, stopwords)?;
    let parents = store.parent_urls(page.id)?;
    let children = store.child_urls(page.id)?;

    let mut block = String::new();
    block.push_str(&format!(
        "Page title: {}\n",
        page.title.as_deref().unwrap_or("")
    ));
    block.push_str(&format!("URL: {}\n", page.url));
    block.push_str(&format!(
        "Last Modification Date: {}\n",
        page.last_modified
            .as_deref()
            .filter(|lm| !lm.is_empty())
            .unwrap_or("N/A")
    ));
    block.push_str(&format!("Size: {} bytes\n", page.size.unwrap_or(0)));
    block.push_str(&format!(
        "Keywords: {}\n",
        join_or_none(keywords.iter().map(|k| k.to_string()), "; ")
    ));
    block.push_str(&format!("Parent Links: {}\n", join_or_none(parents, ", ")));
    block.push_str(&format!("Child Links: {}\n", join_or_none(children, "\n")));

    Ok(block)
}

fn join_or_none(items: impl IntoIterator<Item = String>, separator: &str) -> String {
    let items: Vec<String> = items.into_iter().collect();
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(separator)
    }
}
