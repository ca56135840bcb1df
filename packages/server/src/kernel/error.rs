//! Typed errors raised by the external collaborators.

use thiserror::Error;

/// Content source failures. Each one fails a single analysis.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL not found. Please check the URL and try again.")]
    NotFound,

    #[error("Access forbidden. The website is blocking scraping requests.")]
    Forbidden,

    #[error("Page not found (404). Please verify the URL.")]
    PageNotFound,

    #[error("Server error. The website is currently unavailable.")]
    ServerError,

    #[error("Failed to scrape webpage: {0}")]
    Http(String),

    #[error("Insufficient content found on the page")]
    InsufficientContent,

    #[error("Fetching {url} timed out")]
    Timeout { url: String },
}

/// Judgment adapter failures (upstream model error or unusable output).
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Model request failed: {0}")]
    Network(String),

    #[error("Model API error: {0}")]
    Api(String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Unparseable model response: {0}")]
    Parse(String),

    #[error("Model call timed out")]
    Timeout,
}
