use std::sync::Arc;

use tracing::{error, info, warn};

use super::run_analysis;
use crate::common::{parse_http_url, AnalysisId, StartError};
use crate::domains::analysis::models::{Analysis, AnalysisStatus, NewAnalysis};
use crate::kernel::{catch_panic, ServerDeps};

/// Create a pending analysis for `url` and run the pipeline in the background.
pub async fn start_analysis(url: &str, deps: Arc<ServerDeps>) -> Result<Analysis, StartError> {
    parse_http_url(url)?;
    let url = url.trim().to_string();
    let analysis = deps.store.create_analysis(NewAnalysis::new(url.clone())).await?;
    info!(analysis_id = %analysis.id, url = %url, "Analysis started");

    let id = analysis.id;
    tokio::spawn(async move {
        // A pipeline error is already recorded on the analysis; only a panic needs handling here.
        if let Err(e) = catch_panic(run_analysis(id, &url, &deps)).await {
            error!(analysis_id = %id, url = %url, error = %e, "Analysis task aborted");
            fail_unfinished_analyses(&[id], &deps).await;
        }
    });

    Ok(analysis)
}

/// Mark every analysis in `ids` that is not yet terminal as failed.
///
/// Used when the task driving them is gone. Returns how many were marked.
pub async fn fail_unfinished_analyses(ids: &[AnalysisId], deps: &ServerDeps) -> usize {
    let mut failed = 0;
    for &id in ids {
        let unfinished = match deps.store.get_analysis(id).await {
            Ok(Some(analysis)) => !analysis.status.is_terminal(),
            Ok(None) => false,
            Err(e) => {
                warn!(analysis_id = %id, error = %e, "Could not read analysis");
                false
            }
        };
        if unfinished && mark_failed(id, deps).await {
            failed += 1;
        }
    }
    failed
}

/// Fail analyses left mid-pipeline by a previous process.
///
/// Pipelines run as in-process tasks, so anything not terminal at start-up
/// will never finish. Returns how many were marked failed.
pub async fn fail_interrupted_analyses(deps: &ServerDeps) -> anyhow::Result<usize> {
    let mut failed = 0;
    for status in [
        AnalysisStatus::Pending,
        AnalysisStatus::Scraping,
        AnalysisStatus::Chunking,
        AnalysisStatus::Analyzing,
    ] {
        for analysis in deps.store.analyses_by_status(status).await? {
            if mark_failed(analysis.id, deps).await {
                failed += 1;
            }
        }
    }

    if failed > 0 {
        info!(count = failed, "Marked interrupted analyses as failed");
    }
    Ok(failed)
}

async fn mark_failed(id: AnalysisId, deps: &ServerDeps) -> bool {
    match deps
        .store
        .transition_analysis(id, AnalysisStatus::Failed)
        .await
    {
        Ok(_) => true,
        Err(e) => {
            warn!(analysis_id = %id, error = %e, "Could not mark analysis as failed");
            false
        }
    }
}
