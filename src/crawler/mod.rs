//! Crawler module for web page fetching and indexing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and Last-Modified checks
//! - HTML parsing, text extraction and link extraction
//! - Breadth-first frontier management and the page budget
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, CrawlSummary};
pub use fetcher::{build_http_client, fetch_last_modified, fetch_url, FetchResult, FetchedPage};
pub use parser::{parse_html, ParsedPage};
pub use scheduler::{QueuedUrl, Scheduler};
