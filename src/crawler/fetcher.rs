//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content and its Last-Modified token
//! - HEAD requests to read the live Last-Modified token before a re-fetch
//! - Error classification

use crate::config::UserAgentConfig;
use reqwest::header::LAST_MODIFIED;
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Page body decoded as UTF-8 (lossy)
    pub body: String,
    /// Raw `Last-Modified` header value, empty when the server sent none
    pub last_modified: String,
    /// Length of the body in bytes
    pub size: u64,
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success(FetchedPage),

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, body read failure)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout_secs` - Whole-request timeout in seconds
///
/// # Example
///
/// ```no_run
/// use spindex::config::UserAgentConfig;
/// use spindex::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "Spindex".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, 10).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

fn last_modified_of(response: &Response) -> String {
    response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

fn classify_error(e: reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: "Connection refused".to_string(),
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
        }
    }
}

/// Fetches a URL with a GET request
///
/// Any non-2xx status is reported as `HttpError`; the caller skips the page
/// and carries on with the crawl.
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let last_modified = last_modified_of(&response);

    match response.bytes().await {
        Ok(bytes) => FetchResult::Success(FetchedPage {
            size: bytes.len() as u64,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            last_modified,
        }),
        Err(e) => classify_error(e),
    }
}

/// Sends a HEAD request and returns the live `Last-Modified` token
///
/// # Returns
///
/// * `Some(String)` - Header value, empty when the server sent none
/// * `None` - The request failed or returned a non-success status
pub async fn fetch_last_modified(client: &Client, url: &str) -> Option<String> {
    match client.head(url).send().await {
        Ok(response) if response.status().is_success() => Some(last_modified_of(&response)),
        Ok(response) => {
            tracing::debug!("HEAD {} returned {}", url, response.status());
            None
        }
        Err(e) => {
            tracing::debug!("HEAD {} failed: {}", url, e);
            None
        }
    }
}
