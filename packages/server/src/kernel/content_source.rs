//! HTTP content source - fetches a page with reqwest and extracts its main text
//!
//! - Uses reqwest for HTTP requests (browser-like headers, bounded redirects)
//! - Uses the scraper crate for HTML parsing
//! - Keeps paragraph structure: each block element becomes its own paragraph,
//!   separated by a blank line, so the chunker can split on blank lines
//!
//! Limitations:
//! - No JavaScript rendering

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::FetchError;
use super::{BaseContentSource, ScrapedPage};

/// Pages with less extracted text than this are rejected.
const MIN_CONTENT_LENGTH: usize = 100;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Removed everywhere before text extraction.
const NOISE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "nav",
    "footer",
    ".advertisement",
    ".ads",
    ".social-share",
];

/// Tried in order; the first selector with any match supplies the main text.
const MAIN_SELECTORS: &[&str] = &[
    "main",
    "article",
    ".content",
    ".post-content",
    ".entry-content",
    ".article-content",
    "#content",
    ".main-content",
];

/// Additionally removed when falling back to `<body>`.
const BODY_CHROME_SELECTORS: &[&str] = &["header", ".sidebar", ".navigation", ".menu"];

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "div", "section", "article", "main",
    "blockquote", "pre", "td", "th", "dt", "dd", "figcaption", "header", "body",
];

pub struct HttpContentSource {
    client: reqwest::Client,
}

impl HttpContentSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "HTTP request failed");
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else if e.is_connect() {
                FetchError::NotFound
            } else {
                FetchError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "HTTP error status");
            return Err(match status.as_u16() {
                403 => FetchError::Forbidden,
                404 => FetchError::PageNotFound,
                500..=599 => FetchError::ServerError,
                _ => FetchError::Http(format!("HTTP {} for {}", status, url)),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Http(format!("Failed to read response body: {}", e)))
    }
}

#[async_trait]
impl BaseContentSource for HttpContentSource {
    async fn fetch(&self, url: &str) -> Result<ScrapedPage, FetchError> {
        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        debug!(url = %url, "Fetching page");
        let html = self.fetch_html(url).await?;
        extract_page(url, &html)
    }
}

/// Extract the title and main text of an HTML document.
///
/// Text nodes under the main roots are walked in document order, removed
/// subtrees are skipped, and a new paragraph starts whenever the nearest block
/// ancestor changes.
pub fn extract_page(url: &str, html: &str) -> Result<ScrapedPage, FetchError> {
    let document = Html::parse_document(html);

    let title = extract_title(&document);

    let mut skip: HashSet<_> = NOISE_SELECTORS
        .iter()
        .flat_map(|s| select_all(&document, s))
        .map(|el| el.id())
        .collect();

    let roots = match main_roots(&document) {
        Some(roots) => roots,
        None => {
            skip.extend(
                BODY_CHROME_SELECTORS
                    .iter()
                    .flat_map(|s| select_all(&document, s))
                    .map(|el| el.id()),
            );
            select_all(&document, "body")
        }
    };

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_block = None;
    let mut seen = HashSet::new();

    for root in &roots {
        for node in root.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            if !seen.insert(node.id()) {
                continue;
            }
            if node.ancestors().any(|a| skip.contains(&a.id())) {
                continue;
            }

            let block = node
                .ancestors()
                .find(|a| {
                    a.value()
                        .as_element()
                        .map(|el| BLOCK_ELEMENTS.contains(&el.name()))
                        .unwrap_or(false)
                })
                .map(|a| a.id());

            if block != current_block {
                paragraphs.push(std::mem::take(&mut current));
                current_block = block;
            }
            current.push_str(text);
            current.push(' ');
        }
    }
    paragraphs.push(current);

    let content = paragraphs
        .iter()
        .map(|p| normalize_whitespace(p))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if content.chars().count() < MIN_CONTENT_LENGTH {
        debug!(url = %url, length = content.len(), "Page has minimal content");
        return Err(FetchError::InsufficientContent);
    }

    Ok(ScrapedPage {
        url: url.to_string(),
        title,
        content,
    })
}

fn extract_title(document: &Html) -> String {
    ["title", "h1"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .next()
                .map(|el| normalize_whitespace(&el.text().collect::<String>()))
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| "Untitled Page".to_string())
}

fn select_all<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => vec![],
    }
}

fn main_roots(document: &Html) -> Option<Vec<ElementRef<'_>>> {
    MAIN_SELECTORS
        .iter()
        .map(|s| select_all(document, s))
        .find(|matches| !matches.is_empty())
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
