//! HTML parser for extracting links and text
//!
//! This module handles parsing HTML content to extract:
//! - Page title
//! - Visible body text
//! - Links to follow (from <a> tags)

use scraper::{Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Tags whose text content never counts as visible body text
const HIDDEN_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag), empty when missing
    pub title: String,

    /// Visible text of the <body>
    pub body_text: String,

    /// All links found on the page (absolute URLs, first occurrence order)
    pub links: Vec<String>,
}

/// Parses HTML content and extracts title, body text and links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - empty hrefs and `javascript:` targets
/// - fragment-only links (same page anchors)
/// - anything that is not http or https after resolution
///
/// Fragments are stripped from the resolved URLs.
///
/// # Example
///
/// ```no_run
/// use spindex::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, "Test");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        body_text: extract_body_text(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Collects text nodes under <body> that are not inside hidden tags
fn extract_body_text(document: &Html) -> String {
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    let mut parts = Vec::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| HIDDEN_TAGS.contains(&el.name()))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }

        let text = text.trim();
        if !text.is_empty() {
            parts.push(text);
        }
    }

    parts.join(" ")
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    if seen.insert(absolute_url.clone()) {
                        links.push(absolute_url);
                    }
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.to_ascii_lowercase().starts_with("javascript:") {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}
