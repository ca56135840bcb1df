use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::spawn_batch;
use crate::common::{parse_http_urls, validate_url_count, StartError};
use crate::domains::analysis::models::{Analysis, NewAnalysis};
use crate::domains::batch::models::{Batch, NewBatch};
use crate::kernel::ServerDeps;

pub const MAX_BATCH_URLS: usize = 50;

/// Create a batch with one pending analysis per URL and start processing it.
pub async fn start_batch(
    urls: &[String],
    name: Option<&str>,
    deps: Arc<ServerDeps>,
) -> Result<(Batch, Vec<Analysis>), StartError> {
    validate_url_count(urls, 1, MAX_BATCH_URLS, None)?;
    let urls = parse_http_urls(urls)?;

    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(default_batch_name);

    let batch = deps
        .store
        .create_batch(NewBatch {
            name,
            total_urls: urls.len() as i32,
        })
        .await?;

    let mut analyses = Vec::with_capacity(urls.len());
    for url in &urls {
        let analysis = deps
            .store
            .create_analysis(NewAnalysis::in_batch(url.clone(), batch.id))
            .await?;
        analyses.push(analysis);
    }

    info!(batch_id = %batch.id, name = %batch.name, total = urls.len(), "Batch started");

    let items = analyses.iter().map(|a| (a.id, a.url.clone())).collect();
    spawn_batch(batch.id, items, deps);

    Ok((batch, analyses))
}

fn default_batch_name() -> String {
    format!("Batch Analysis {}", Utc::now().format("%Y-%m-%d"))
}
