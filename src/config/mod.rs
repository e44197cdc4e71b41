//! Configuration module for Spindex
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use spindex::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("spindex.toml")).unwrap();
//! println!("Crawl budget: {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, IndexConfig, OutputConfig, RecrawlPolicy, SearchConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
