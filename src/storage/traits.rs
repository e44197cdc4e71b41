//! Storage traits and error types
//!
//! This module defines the trait interface for index store backends and
//! associated error types.

use crate::config::RecrawlPolicy;
use crate::storage::{
    Field, IndexCounts, Keyword, PageMeta, PageRecord, Posting, RunRecord, RunStatus,
    TermFrequencies,
};
use crate::text::Token;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for index store implementations
///
/// Lookups of unknown URLs, pages or terms return empty collections or
/// zero; they never fail.
pub trait IndexStore {
    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Records the final status and finish timestamp of a run
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Completed)
    }

    // ===== Index Writes =====

    /// Adds one field of a fetched page to the index
    ///
    /// Creates or updates the page row and term rows, merges the term
    /// positions into the field's postings according to `policy`, overwrites
    /// the page's max term frequency for the field with this pass's maximum,
    /// and increments the document frequency of every term appearing in this
    /// (page, field) for the first time.
    fn add_field_entry(
        &mut self,
        page: &PageMeta,
        field: Field,
        tokens: &[Token],
        policy: RecrawlPolicy,
    ) -> StorageResult<i64>;

    /// Records a directed link, creating placeholder pages as needed
    ///
    /// Duplicate edges are ignored.
    fn add_link(&mut self, parent_url: &str, child_url: &str) -> StorageResult<()>;

    // ===== Page Lookups =====

    /// Gets a page by ID
    fn get_page(&self, page_id: i64) -> StorageResult<Option<PageRecord>>;

    /// Gets a page by URL
    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Lists every indexed page in ID order
    fn indexed_pages(&self) -> StorageResult<Vec<PageRecord>>;

    /// Number of pages that have been indexed (placeholders excluded)
    fn count_indexed_pages(&self) -> StorageResult<u64>;

    // ===== Postings and Caches =====

    /// IDs of pages whose `field` contains `term`
    fn pages_with_term(&self, term: &str, field: Field) -> StorageResult<Vec<i64>>;

    /// Frequency and positions of `term` in `field` of a page
    fn posting(&self, term: &str, page_id: i64, field: Field) -> StorageResult<Posting>;

    /// Number of distinct pages containing `term` in `field`
    fn document_frequency(&self, term: &str, field: Field) -> StorageResult<u32>;

    /// Largest term frequency of a page's `field` from its latest pass
    fn max_term_frequency(&self, page_id: i64, field: Field) -> StorageResult<u32>;

    /// Every term of a page with its body and title frequencies
    fn page_terms(&self, page_id: i64) -> StorageResult<Vec<TermFrequencies>>;

    // ===== Link Graph =====

    /// URLs of pages linking to this page
    fn parent_urls(&self, page_id: i64) -> StorageResult<Vec<String>>;

    /// URLs this page links to, at most 10
    fn child_urls(&self, page_id: i64) -> StorageResult<Vec<String>>;

    // ===== Reporting =====

    /// Top terms of a page by combined body + title frequency
    ///
    /// Ties are ordered by term so the listing is stable.
    fn top_keywords(
        &self,
        page_id: i64,
        limit: usize,
        stopwords: &HashSet<String>,
    ) -> StorageResult<Vec<Keyword>>;

    /// Row counts across the index tables
    fn counts(&self) -> StorageResult<IndexCounts>;
}
