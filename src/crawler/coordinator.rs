//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Deciding whether a queued page needs (re)fetching
//! - Coordinating fetching, parsing, and normalization
//! - Writing both fields of a page and its link edges into the index store
//! - Handling cancellation and recording the run

use crate::config::Config;
use crate::crawler::parser::parse_html;
use crate::crawler::scheduler::{QueuedUrl, Scheduler};
use crate::crawler::{build_http_client, fetch_last_modified, fetch_url, FetchResult};
use crate::storage::{lock_store, open_shared, Field, IndexStore, PageMeta, RunStatus, SharedStore};
use crate::text::{normalizer_for, Normalizer};
use crate::Result;
use reqwest::Client;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

/// Counters reported at the end of a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages_indexed: u32,
    pub pages_skipped: u32,
    pub fetch_failures: u32,
    pub links_discovered: u64,
    pub cancelled: bool,
}

/// Outcome of comparing a page's stored and live Last-Modified tokens
enum Freshness {
    Unchanged,
    Stale { prefetched: Option<FetchResult> },
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    store: SharedStore,
    normalizer: Arc<Normalizer>,
    scheduler: Scheduler,
    client: Client,
    config_hash: String,
    cancel: Arc<AtomicBool>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `store` - Shared handle to the index store
    /// * `normalizer` - The normalizer also used by the query engine
    pub fn new(config: Config, store: SharedStore, normalizer: Arc<Normalizer>) -> Result<Self> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout)?;
        let scheduler = Scheduler::new(&config.crawler);

        Ok(Self {
            config: Arc::new(config),
            store,
            normalizer,
            scheduler,
            client,
            config_hash: String::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Sets the config hash recorded on the crawl run
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    /// Flag that stops the crawl before the next page when set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Runs the crawl and records it in the runs table
    pub async fn run(&mut self) -> Result<CrawlSummary> {
        let run_id = lock_store(&self.store)?.create_run(&self.config_hash)?;
        tracing::info!(
            "Starting crawl run {} from {} (budget {} pages)",
            run_id,
            self.scheduler.seed_url(),
            self.config.crawler.max_pages
        );

        let result = self.crawl_loop().await;

        let status = match &result {
            Ok(summary) if summary.cancelled => RunStatus::Interrupted,
            Ok(_) => RunStatus::Completed,
            Err(_) => RunStatus::Failed,
        };
        lock_store(&self.store)?.finish_run(run_id, status)?;

        if let Ok(summary) = &result {
            tracing::info!(
                "Crawl {}: {} pages indexed, {} unchanged, {} fetch failures, {} links discovered",
                status.to_db_string(),
                summary.pages_indexed,
                summary.pages_skipped,
                summary.fetch_failures,
                summary.links_discovered
            );
        }

        result
    }

    async fn crawl_loop(&mut self) -> Result<CrawlSummary> {
        let mut summary = CrawlSummary::default();
        let start_time = std::time::Instant::now();

        while let Some(queued) = self.scheduler.next_url() {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::warn!("Crawl cancelled, stopping before {}", queued.url);
                summary.cancelled = true;
                break;
            }

            if self.scheduler.is_visited(&queued.url) {
                continue;
            }

            let prefetched = match self.should_fetch(&queued.url).await? {
                Freshness::Unchanged => {
                    tracing::debug!("Unchanged since last index: {}", queued.url);
                    summary.pages_skipped += 1;
                    continue;
                }
                Freshness::Stale { prefetched } => prefetched,
            };

            if !self.process_url(&queued, prefetched, &mut summary).await? {
                continue;
            }

            summary.pages_indexed += 1;

            if summary.pages_indexed % 10 == 0 {
                tracing::info!(
                    "Progress: {} pages indexed, {} in frontier, {:.1}s elapsed",
                    summary.pages_indexed,
                    self.scheduler.frontier_size(),
                    start_time.elapsed().as_secs_f64()
                );
            }

            if !self.scheduler.budget_exhausted() {
                self.scheduler.wait_politely().await;
            }
        }

        if self.scheduler.budget_exhausted() {
            tracing::info!("Page budget of {} reached", self.config.crawler.max_pages);
        } else if self.scheduler.is_empty() {
            tracing::info!(
                "Frontier exhausted after {} pages",
                self.scheduler.pages_crawled()
            );
        }

        Ok(summary)
    }

    /// Decides whether a page needs fetching
    ///
    /// Stale when the page was never indexed or its Last-Modified token
    /// changed. The live token comes from a HEAD request. Servers that reject
    /// HEAD are asked with a GET instead, and that response is handed back so
    /// the page is not downloaded twice.
    async fn should_fetch(&self, url: &str) -> Result<Freshness> {
        let stored = lock_store(&self.store)?.get_page_by_url(url)?;
        let Some(page) = stored.filter(|p| p.is_indexed()) else {
            return Ok(Freshness::Stale { prefetched: None });
        };
        let stored_token = page.last_modified.unwrap_or_default();

        if let Some(live) = fetch_last_modified(&self.client, url).await {
            return Ok(if live == stored_token {
                Freshness::Unchanged
            } else {
                Freshness::Stale { prefetched: None }
            });
        }

        tracing::debug!("HEAD unavailable for {}, checking with GET", url);
        let result = fetch_url(&self.client, url).await;
        let unchanged = matches!(
            &result,
            FetchResult::Success(fetched) if fetched.last_modified == stored_token
        );

        if unchanged {
            Ok(Freshness::Unchanged)
        } else {
            Ok(Freshness::Stale {
                prefetched: Some(result),
            })
        }
    }

    /// Fetches, parses and indexes one page
    ///
    /// `prefetched` is a response already obtained while checking freshness.
    /// Returns `Ok(false)` when the fetch failed; the URL stays unvisited.
    async fn process_url(
        &mut self,
        queued: &QueuedUrl,
        prefetched: Option<FetchResult>,
        summary: &mut CrawlSummary,
    ) -> Result<bool> {
        let result = match prefetched {
            Some(result) => result,
            None => fetch_url(&self.client, &queued.url).await,
        };

        let page = match result {
            FetchResult::Success(page) => page,
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Skipping {}: HTTP {}", queued.url, status_code);
                summary.fetch_failures += 1;
                return Ok(false);
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Skipping {}: {}", queued.url, error);
                summary.fetch_failures += 1;
                return Ok(false);
            }
        };

        let base_url = Url::parse(&queued.url)?;
        let parsed = parse_html(&page.body, &base_url);

        let title_tokens = self.normalizer.normalize(&parsed.title);
        let body_tokens = self.normalizer.normalize(&parsed.body_text);

        let meta = PageMeta {
            url: queued.url.clone(),
            title: parsed.title.clone(),
            last_modified: page.last_modified,
            size: page.size,
        };
        let policy = self.config.index.recrawl_policy;
        let is_seed = queued.url == self.scheduler.seed_url();

        {
            let mut store = lock_store(&self.store)?;
            store.add_field_entry(&meta, Field::Body, &body_tokens, policy)?;
            store.add_field_entry(&meta, Field::Title, &title_tokens, policy)?;

            if !is_seed {
                for link in &parsed.links {
                    store.add_link(&queued.url, link)?;
                }
            }
            if let Some(parent) = &queued.parent {
                store.add_link(parent, &queued.url)?;
            }
        }

        tracing::debug!(
            "Indexed {} ({} body terms, {} title terms, {} links)",
            queued.url,
            body_tokens.len(),
            title_tokens.len(),
            parsed.links.len()
        );

        summary.links_discovered += parsed.links.len() as u64;
        for link in parsed.links {
            self.scheduler
                .enqueue(QueuedUrl::child(link, queued.url.clone()));
        }

        self.scheduler.mark_visited(&queued.url);
        Ok(true)
    }
}

/// Runs a complete crawl with the given configuration
///
/// Opens the index store, builds the normalizer, and crawls until the
/// frontier is empty, the page budget is spent, or Ctrl-C is pressed.
///
/// # Example
///
/// ```no_run
/// use spindex::config::load_config_with_hash;
/// use spindex::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("spindex.toml"))?;
/// let summary = run_crawl(config, &hash).await?;
/// println!("{} pages indexed", summary.pages_indexed);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, config_hash: &str) -> Result<CrawlSummary> {
    let store = open_shared(Path::new(&config.index.database_path))?;
    let normalizer = Arc::new(normalizer_for(&config.index)?);

    let mut coordinator = Coordinator::new(config, store, normalizer)?.with_config_hash(config_hash);

    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing the current page");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    coordinator.run().await
}
