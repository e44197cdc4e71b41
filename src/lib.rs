//! Spindex: a polite site crawler with a positional search index
//!
//! This crate crawls a seed web site breadth-first, builds a positional
//! inverted index over page titles and bodies in SQLite, and answers
//! free-text and phrase queries with a weighted cosine vector-space model.

pub mod config;
pub mod crawler;
pub mod output;
pub mod search;
pub mod storage;
pub mod text;

use thiserror::Error;

/// Main error type for Spindex operations
#[derive(Debug, Error)]
pub enum SpindexError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index store lock poisoned")]
    LockPoisoned,

    #[error("Page not indexed: {0}")]
    PageNotIndexed(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Spindex operations
pub type Result<T> = std::result::Result<T, SpindexError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use search::{QueryEngine, SearchHit, SearchNotice, SearchResults};
pub use storage::{Field, IndexStore, SharedStore, SqliteStorage};
pub use text::Normalizer;
