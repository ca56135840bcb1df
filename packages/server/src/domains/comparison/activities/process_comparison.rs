use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::common::{AnalysisId, ComparisonId};
use crate::domains::analysis::activities::fail_unfinished_analyses;
use crate::domains::analysis::run_analysis;
use crate::domains::comparison::models::{Comparison, ComparisonStatus};
use crate::kernel::{catch_panic, ServerDeps};

/// Run a comparison's analyses one at a time, baseline first.
///
/// The comparison completes once every item has been attempted, whatever the
/// individual outcomes.
pub async fn process_comparison(
    comparison_id: ComparisonId,
    items: &[(AnalysisId, String)],
    deps: &ServerDeps,
) -> Result<Comparison> {
    deps.store
        .set_comparison_status(comparison_id, ComparisonStatus::Processing)
        .await?;
    info!(comparison_id = %comparison_id, total = items.len(), "Comparison processing started");

    for (id, url) in items {
        if let Err(e) = run_analysis(*id, url, deps).await {
            warn!(
                comparison_id = %comparison_id,
                analysis_id = %id,
                error = %e,
                "Comparison item failed"
            );
        }
    }

    let comparison = deps
        .store
        .set_comparison_status(comparison_id, ComparisonStatus::Completed)
        .await?;
    info!(comparison_id = %comparison_id, "Comparison completed");

    Ok(comparison)
}

/// Spawn `process_comparison`, marking the comparison failed if orchestration breaks.
pub fn spawn_comparison(
    comparison_id: ComparisonId,
    items: Vec<(AnalysisId, String)>,
    deps: Arc<ServerDeps>,
) {
    tokio::spawn(async move {
        let outcome = catch_panic(process_comparison(comparison_id, &items, &deps))
            .await
            .and_then(|result| result);

        if let Err(e) = outcome {
            error!(comparison_id = %comparison_id, error = %e, "Comparison processing failed");
            let ids: Vec<AnalysisId> = items.iter().map(|(id, _)| *id).collect();
            fail_unfinished_analyses(&ids, &deps).await;
            if let Err(mark_err) = deps
                .store
                .set_comparison_status(comparison_id, ComparisonStatus::Failed)
                .await
            {
                error!(
                    comparison_id = %comparison_id,
                    error = %mark_err,
                    "Could not mark comparison as failed"
                );
            }
        }
    });
}
