//! Input validation for request payloads.

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    UrlCount(String),

    #[error("{field} is required")]
    Required { field: &'static str },
}

/// Parse an absolute http(s) URL.
pub fn parse_http_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw.trim()).map_err(|_| ValidationError::InvalidUrl(raw.to_string()))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(ValidationError::InvalidUrl(raw.to_string())),
    }
}

/// Check a URL list length against inclusive bounds.
///
/// `context` is appended to the messages, e.g. "for comparison".
pub fn validate_url_count(
    urls: &[String],
    min: usize,
    max: usize,
    context: Option<&str>,
) -> Result<(), ValidationError> {
    let suffix = context.map(|c| format!(" {}", c)).unwrap_or_default();

    if urls.len() < min {
        let message = match min {
            1 => "At least one URL is required".to_string(),
            2 => format!("At least two URLs are required{}", suffix),
            n => format!("At least {} URLs are required{}", n, suffix),
        };
        return Err(ValidationError::UrlCount(message));
    }

    if urls.len() > max {
        return Err(ValidationError::UrlCount(format!(
            "Maximum {} URLs allowed{}",
            max, suffix
        )));
    }

    Ok(())
}

/// Validate every URL in a list, returning the normalised strings in order.
pub fn parse_http_urls(urls: &[String]) -> Result<Vec<String>, ValidationError> {
    urls.iter()
        .map(|raw| parse_http_url(raw).map(|_| raw.trim().to_string()))
        .collect()
}
