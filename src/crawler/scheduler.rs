//! Scheduler for managing the crawl frontier
//!
//! This module handles:
//! - The FIFO queue of `(url, parent)` pairs, giving breadth-first order
//! - The visited set of pages indexed during this run
//! - The page budget
//! - The politeness delay between fetches

use crate::config::CrawlerConfig;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use url::Url;

/// A URL queued for fetching together with the page that linked to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// The URL to fetch
    pub url: String,

    /// The referring page, `None` for the seed
    pub parent: Option<String>,
}

impl QueuedUrl {
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parent: None,
        }
    }

    pub fn child(url: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parent: Some(parent.into()),
        }
    }
}

/// Scheduler owns the frontier, the visited set and the page budget
///
/// Duplicates are allowed in the queue; they are filtered against the
/// visited set when dequeued.
pub struct Scheduler {
    seed_url: String,
    frontier: VecDeque<QueuedUrl>,
    visited: HashSet<String>,
    pages_crawled: u32,
    max_pages: u32,
    politeness_delay: Duration,
}

impl Scheduler {
    /// Creates a scheduler seeded with the configured start URL
    ///
    /// The seed is serialized the same way discovered links are, so that
    /// `https://example.com` and `https://example.com/` are one page.
    pub fn new(config: &CrawlerConfig) -> Self {
        let seed_url = Url::parse(&config.seed_url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| config.seed_url.clone());

        let mut frontier = VecDeque::new();
        frontier.push_back(QueuedUrl::seed(seed_url.clone()));

        Self {
            seed_url,
            frontier,
            visited: HashSet::new(),
            pages_crawled: 0,
            max_pages: config.max_pages,
            politeness_delay: Duration::from_millis(config.politeness_delay),
        }
    }

    /// Pops the next URL, or `None` when the queue is empty or the budget spent
    pub fn next_url(&mut self) -> Option<QueuedUrl> {
        if self.budget_exhausted() {
            return None;
        }
        self.frontier.pop_front()
    }

    pub fn seed_url(&self) -> &str {
        &self.seed_url
    }

    /// Appends a URL to the back of the queue
    pub fn enqueue(&mut self, url: QueuedUrl) {
        self.frontier.push_back(url);
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Marks a page as indexed during this run and counts it against the budget
    pub fn mark_visited(&mut self, url: &str) {
        if self.visited.insert(url.to_string()) {
            self.pages_crawled += 1;
        }
    }

    pub fn budget_exhausted(&self) -> bool {
        self.pages_crawled >= self.max_pages
    }

    pub fn pages_crawled(&self) -> u32 {
        self.pages_crawled
    }

    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Sleeps for the politeness delay
    pub async fn wait_politely(&self) {
        if !self.politeness_delay.is_zero() {
            tokio::time::sleep(self.politeness_delay).await;
        }
    }
}
