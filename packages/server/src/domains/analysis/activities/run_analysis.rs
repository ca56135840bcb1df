//! Analysis pipeline - drives one URL from `pending` to `completed` or `failed`.

use tracing::{debug, info, warn};

use crate::common::{AnalysisId, Coverage, SemanticChunk};
use crate::domains::analysis::chunker;
use crate::domains::analysis::models::{Analysis, AnalysisResults, AnalysisStatus};
use crate::domains::analysis::PipelineError;
use crate::kernel::{FetchError, JudgeError, Judgment, ServerDeps};

/// Run the pipeline for an existing pending analysis.
///
/// Each stage is persisted before it starts so pollers see progress. On any
/// error the analysis is marked `failed` and the error is returned to the caller.
pub async fn run_analysis(
    id: AnalysisId,
    url: &str,
    deps: &ServerDeps,
) -> Result<Analysis, PipelineError> {
    match drive(id, url, deps).await {
        Ok(analysis) => {
            info!(
                analysis_id = %id,
                url = %url,
                coverage_score = ?analysis.coverage_score,
                "Analysis completed"
            );
            Ok(analysis)
        }
        Err(e) => {
            warn!(analysis_id = %id, url = %url, error = %e, "Analysis failed");
            if let Err(mark_err) = deps
                .store
                .transition_analysis(id, AnalysisStatus::Failed)
                .await
            {
                warn!(
                    analysis_id = %id,
                    error = %mark_err,
                    "Could not mark analysis as failed"
                );
            }
            Err(e)
        }
    }
}

async fn drive(id: AnalysisId, url: &str, deps: &ServerDeps) -> Result<Analysis, PipelineError> {
    let store = &deps.store;

    store.transition_analysis(id, AnalysisStatus::Scraping).await?;
    debug!(analysis_id = %id, url = %url, "Scraping");
    let page = deps
        .within_stage_deadline(deps.content_source.fetch(url))
        .await
        .unwrap_or_else(|| {
            Err(FetchError::Timeout {
                url: url.to_string(),
            })
        })?;

    store.transition_analysis(id, AnalysisStatus::Chunking).await?;
    let chunks = chunker::chunk(&page.content, &page.title);
    debug!(analysis_id = %id, chunks = chunks.len(), "Chunked content");

    store.transition_analysis(id, AnalysisStatus::Analyzing).await?;
    let judgment = deps
        .within_stage_deadline(deps.judge.judge(&page.title, &page.content, &chunks))
        .await
        .unwrap_or(Err(JudgeError::Timeout))?;

    let results = summarize(page.title, judgment, chunks);
    Ok(store.complete_analysis(id, results).await?)
}

/// Fold a judgment and the detected chunks into the stored result fields.
pub fn summarize(title: String, judgment: Judgment, chunks: Vec<SemanticChunk>) -> AnalysisResults {
    let covered = judgment
        .queries
        .iter()
        .filter(|q| q.coverage == Coverage::Yes)
        .count();

    AnalysisResults {
        title,
        primary_entity: judgment.primary_entity,
        semantic_chunks: i32::try_from(chunks.len()).unwrap_or(i32::MAX),
        query_coverage: format!("{}/{}", covered, judgment.queries.len()),
        coverage_score: clamp_score(judgment.coverage_score),
        queries: judgment.queries,
        recommendations: judgment.recommendations,
        semantic_chunks_data: chunks,
    }
}

/// Round to the nearest integer within 0..=10.
fn clamp_score(score: f64) -> i32 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 10.0) as i32
}
