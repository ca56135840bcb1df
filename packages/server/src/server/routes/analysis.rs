use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::RecentQuery;
use crate::common::AnalysisId;
use crate::domains::analysis::export::{export_analysis, ExportFormat};
use crate::domains::analysis::{start_analysis, Analysis, AnalysisStatus};
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub id: AnalysisId,
    pub status: AnalysisStatus,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// Parse the `:id` segment, rejecting non-numeric ids.
pub fn parse_analysis_id(raw: &str) -> ApiResult<AnalysisId> {
    raw.parse()
        .map_err(|_| ApiError::Validation("Invalid analysis ID".to_string()))
}

async fn find_analysis(state: &AppState, raw_id: &str) -> ApiResult<Analysis> {
    let id = parse_analysis_id(raw_id)?;
    state
        .deps
        .store
        .get_analysis(id)
        .await
        .map_err(ApiError::internal("Failed to retrieve analysis"))?
        .ok_or_else(|| ApiError::not_found("Analysis"))
}

/// POST /api/analyze
pub async fn analyze_handler(
    Extension(state): Extension<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AnalyzeResponse>)> {
    let Json(request) = body?;
    let analysis = start_analysis(&request.url, state.deps.clone()).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(AnalyzeResponse {
            id: analysis.id,
            status: analysis.status,
            message: "Analysis started successfully",
        }),
    ))
}

/// GET /api/analysis/:id
pub async fn analysis_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Analysis>> {
    Ok(Json(find_analysis(&state, &id).await?))
}

/// GET /api/analysis/:id/export?format=json|csv
pub async fn analysis_export_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let analysis = find_analysis(&state, &id).await?;
    let format = ExportFormat::from_param(query.format.as_deref());
    let file = export_analysis(&analysis, format)
        .map_err(ApiError::internal("Failed to export analysis"))?;

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.body,
    ))
}

/// GET /api/analyses/recent?limit=N
pub async fn recent_analyses_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<Analysis>>> {
    let analyses = state
        .deps
        .store
        .recent_analyses(query.limit())
        .await
        .map_err(ApiError::internal("Failed to retrieve recent analyses"))?;

    Ok(Json(analyses))
}
