//! Batch coordinator - runs a batch's analyses in groups of `BATCH_CONCURRENCY`.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, error, info};

use crate::common::{AnalysisId, BatchId};
use crate::domains::analysis::activities::fail_unfinished_analyses;
use crate::domains::analysis::run_analysis;
use crate::domains::batch::models::{Batch, BatchProgress, BatchStatus};
use crate::kernel::{catch_panic, ServerDeps};

/// Analyses in flight at once. Each group settles before the next starts.
pub const BATCH_CONCURRENCY: usize = 3;

/// Drive every analysis of a batch, recording counters after each group.
///
/// Per-item failures are counted, never propagated; the batch completes even
/// if every item failed. An `Err` here means orchestration itself broke.
pub async fn process_batch(
    batch_id: BatchId,
    items: &[(AnalysisId, String)],
    deps: &ServerDeps,
) -> Result<Batch> {
    deps.store
        .update_batch(batch_id, BatchProgress::status(BatchStatus::Processing))
        .await?;
    info!(batch_id = %batch_id, total = items.len(), "Batch processing started");

    let mut completed: i32 = 0;
    let mut failed: i32 = 0;

    for group in items.chunks(BATCH_CONCURRENCY) {
        let outcomes = join_all(
            group
                .iter()
                .map(|(id, url)| run_analysis(*id, url, deps)),
        )
        .await;

        for outcome in outcomes {
            match outcome {
                Ok(_) => completed += 1,
                Err(_) => failed += 1,
            }
        }

        deps.store
            .update_batch(batch_id, BatchProgress::counts(completed, failed))
            .await?;
        debug!(batch_id = %batch_id, completed, failed, "Batch group settled");
    }

    let batch = deps
        .store
        .update_batch(batch_id, BatchProgress::finished(completed, failed))
        .await?;
    info!(batch_id = %batch_id, completed, failed, "Batch completed");

    Ok(batch)
}

/// Spawn `process_batch`, marking the batch failed if orchestration breaks.
///
/// A panic counts as a broken orchestration. Analyses the task left unfinished
/// are failed along with the batch.
pub fn spawn_batch(batch_id: BatchId, items: Vec<(AnalysisId, String)>, deps: Arc<ServerDeps>) {
    tokio::spawn(async move {
        let outcome = catch_panic(process_batch(batch_id, &items, &deps))
            .await
            .and_then(|result| result);

        if let Err(e) = outcome {
            error!(batch_id = %batch_id, error = %e, "Batch processing failed");
            let ids: Vec<AnalysisId> = items.iter().map(|(id, _)| *id).collect();
            fail_unfinished_analyses(&ids, &deps).await;
            if let Err(mark_err) = deps
                .store
                .update_batch(batch_id, BatchProgress::status(BatchStatus::Failed))
                .await
            {
                error!(batch_id = %batch_id, error = %mark_err, "Could not mark batch as failed");
            }
        }
    });
}
