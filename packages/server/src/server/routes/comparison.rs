use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::RecentQuery;
use crate::common::ComparisonId;
use crate::domains::analysis::Analysis;
use crate::domains::comparison::{
    compare, start_comparison, Comparison, ComparisonResult, ComparisonStatus,
};
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub id: ComparisonId,
    pub name: String,
    pub description: Option<String>,
    pub status: ComparisonStatus,
    pub total_urls: usize,
}

/// A comparison with its analyses resolved and, once every analysis has
/// completed, the comparison computed over them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonDetail {
    #[serde(flatten)]
    pub comparison: Comparison,
    pub analyses: Vec<Analysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_data: Option<ComparisonResult>,
}

/// POST /api/compare
pub async fn compare_handler(
    Extension(state): Extension<AppState>,
    body: Result<Json<CompareRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CompareResponse>)> {
    let Json(request) = body?;
    let comparison = start_comparison(
        &request.name,
        request.description.as_deref(),
        &request.urls,
        state.deps.clone(),
    )
    .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CompareResponse {
            total_urls: comparison.analysis_ids.len(),
            id: comparison.id,
            name: comparison.name,
            description: comparison.description,
            status: comparison.status,
        }),
    ))
}

/// GET /api/comparison/:id
pub async fn comparison_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ComparisonDetail>> {
    let Ok(id) = id.parse::<ComparisonId>() else {
        return Err(ApiError::not_found("Comparison"));
    };
    let store = &state.deps.store;

    let comparison = store
        .get_comparison(id)
        .await
        .map_err(ApiError::internal("Failed to retrieve comparison"))?
        .ok_or_else(|| ApiError::not_found("Comparison"))?;

    let mut analyses = Vec::with_capacity(comparison.analysis_ids.len());
    for analysis_id in &comparison.analysis_ids {
        let found = store
            .get_analysis(*analysis_id)
            .await
            .map_err(ApiError::internal("Failed to retrieve comparison"))?;
        analyses.extend(found);
    }

    let comparison_data = if analyses.iter().all(Analysis::is_completed) {
        match compare(&analyses) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(comparison_id = %id, error = %e, "Comparison analysis skipped");
                None
            }
        }
    } else {
        None
    };

    Ok(Json(ComparisonDetail {
        comparison,
        analyses,
        comparison_data,
    }))
}

/// GET /api/comparisons/recent?limit=N
pub async fn recent_comparisons_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<Comparison>>> {
    let comparisons = state
        .deps
        .store
        .recent_comparisons(query.limit())
        .await
        .map_err(ApiError::internal("Failed to retrieve recent comparisons"))?;

    Ok(Json(comparisons))
}
