//! Storage module for the positional index
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Pages, vocabulary and per-field positional postings
//! - Document-frequency and max-term-frequency caches
//! - The parent/child link graph
//! - Crawl run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{IndexStore, StorageError, StorageResult};

use crate::{Result, SpindexError};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Store handle shared by the crawler and the query engine
///
/// All access is serialized through the mutex, so a reader never observes a
/// page between its body and title writes.
pub type SharedStore = Arc<Mutex<SqliteStorage>>;

/// Opens (or creates) the index database and wraps it in a shared handle
pub fn open_shared(path: &Path) -> Result<SharedStore> {
    Ok(Arc::new(Mutex::new(SqliteStorage::new(path)?)))
}

/// Locks a shared store, mapping a poisoned lock to an error
pub fn lock_store(store: &SharedStore) -> Result<MutexGuard<'_, SqliteStorage>> {
    store.lock().map_err(|_| SpindexError::LockPoisoned)
}

/// The two indexed fields of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Body,
    Title,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::Body, Field::Title];

    pub(crate) fn postings_table(&self) -> &'static str {
        match self {
            Self::Body => "body_postings",
            Self::Title => "title_postings",
        }
    }

    pub(crate) fn df_table(&self) -> &'static str {
        match self {
            Self::Body => "body_df",
            Self::Title => "title_df",
        }
    }

    pub(crate) fn maxtf_table(&self) -> &'static str {
        match self {
            Self::Body => "body_maxtf",
            Self::Title => "title_maxtf",
        }
    }

    pub(crate) fn length_column(&self) -> &'static str {
        match self {
            Self::Body => "body_length",
            Self::Title => "title_length",
        }
    }
}

/// Page metadata captured by a fetch, written alongside each field entry
#[derive(Debug, Clone)]
pub struct PageMeta {
    pub url: String,
    pub title: String,
    pub last_modified: String,
    pub size: u64,
}

/// Represents a page in the database
///
/// Placeholder rows created for link targets that were never fetched have
/// no `last_modified`, `size` or `indexed_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub last_modified: Option<String>,
    pub size: Option<u64>,
    pub body_length: u32,
    pub title_length: u32,
    pub indexed_at: Option<String>,
}

impl PageRecord {
    pub fn is_indexed(&self) -> bool {
        self.indexed_at.is_some()
    }
}

/// Frequency and position list of one term in one field of one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Posting {
    pub frequency: u32,
    pub positions: Vec<u32>,
}

/// Raw body and title frequency of a term within a single page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermFrequencies {
    pub term: String,
    pub body: u32,
    pub title: u32,
}

/// A page keyword with its combined body and title frequency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub term: String,
    pub frequency: u32,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.term, self.frequency)
    }
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Row counts across the index tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexCounts {
    pub total_pages: u64,
    pub indexed_pages: u64,
    pub terms: u64,
    pub body_postings: u64,
    pub title_postings: u64,
    pub links: u64,
}

pub(crate) fn encode_positions(positions: &[u32]) -> String {
    positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn decode_positions(raw: &str) -> Vec<u32> {
    raw.split(',')
        .filter_map(|p| p.trim().parse().ok())
        .collect()
}
