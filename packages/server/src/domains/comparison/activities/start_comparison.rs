use std::sync::Arc;

use tracing::info;

use super::spawn_comparison;
use crate::common::{parse_http_urls, validate_url_count, StartError, ValidationError};
use crate::domains::analysis::models::NewAnalysis;
use crate::domains::comparison::models::{Comparison, NewComparison};
use crate::kernel::ServerDeps;

pub const MIN_COMPARISON_URLS: usize = 2;
pub const MAX_COMPARISON_URLS: usize = 10;

/// Create one pending analysis per URL (first is the baseline), record the
/// comparison and start processing it.
pub async fn start_comparison(
    name: &str,
    description: Option<&str>,
    urls: &[String],
    deps: Arc<ServerDeps>,
) -> Result<Comparison, StartError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required { field: "Name" }.into());
    }
    validate_url_count(
        urls,
        MIN_COMPARISON_URLS,
        MAX_COMPARISON_URLS,
        Some("for comparison"),
    )?;
    let urls = parse_http_urls(urls)?;

    let mut items = Vec::with_capacity(urls.len());
    for url in urls {
        let analysis = deps.store.create_analysis(NewAnalysis::new(url.clone())).await?;
        items.push((analysis.id, url));
    }

    let comparison = deps
        .store
        .create_comparison(NewComparison {
            name: name.to_string(),
            description: description.map(str::to_string),
            analysis_ids: items.iter().map(|(id, _)| *id).collect(),
        })
        .await?;

    info!(
        comparison_id = %comparison.id,
        name = %comparison.name,
        total = items.len(),
        "Comparison started"
    );

    spawn_comparison(comparison.id, items, deps);

    Ok(comparison)
}
