use serde::Deserialize;

/// Main configuration structure for Spindex
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URL the breadth-first crawl starts from
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Maximum number of pages indexed in one run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Pause between successive fetches (milliseconds)
    #[serde(rename = "politeness-delay", default = "default_politeness_delay")]
    pub politeness_delay: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Index store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Optional stopword list, one word per line
    #[serde(rename = "stopwords-path", default)]
    pub stopwords_path: Option<String>,

    /// How a re-fetched page is merged with its existing postings
    #[serde(rename = "recrawl-policy", default)]
    pub recrawl_policy: RecrawlPolicy,
}

/// Merge behavior for pages indexed more than once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecrawlPolicy {
    /// Add the new pass's frequencies and positions to the stored ones
    #[default]
    Accumulate,
    /// Drop the page's stored postings for the field before indexing
    Replace,
}

/// Query engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of ranked results returned per query
    #[serde(rename = "top-k", default = "default_top_k")]
    pub top_k: usize,

    /// Results per page in the presentation layer
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            page_size: default_page_size(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the plain-text spider report
    #[serde(rename = "report-path")]
    pub report_path: String,
}

fn default_max_pages() -> u32 {
    30
}

fn default_politeness_delay() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    10
}

fn default_top_k() -> usize {
    50
}

fn default_page_size() -> usize {
    7
}
