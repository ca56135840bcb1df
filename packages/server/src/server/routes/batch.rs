use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::RecentQuery;
use crate::common::BatchId;
use crate::domains::analysis::Analysis;
use crate::domains::batch::export::batch_csv;
use crate::domains::batch::{start_batch, Batch, BatchStatus};
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub urls: Vec<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStartResponse {
    pub id: BatchId,
    pub name: String,
    pub total_urls: i32,
    pub status: BatchStatus,
    pub message: &'static str,
}

/// A batch with its analyses resolved.
#[derive(Debug, Serialize)]
pub struct BatchDetail {
    #[serde(flatten)]
    pub batch: Batch,
    pub progress: i32,
    pub analyses: Vec<Analysis>,
}

async fn find_batch(state: &AppState, raw_id: &str) -> ApiResult<Batch> {
    // Unknown and malformed ids look the same to clients.
    let Ok(id) = raw_id.parse::<BatchId>() else {
        return Err(ApiError::not_found("Batch"));
    };

    state
        .deps
        .store
        .get_batch(id)
        .await
        .map_err(ApiError::internal("Failed to retrieve batch"))?
        .ok_or_else(|| ApiError::not_found("Batch"))
}

/// POST /api/analyze/batch
pub async fn batch_start_handler(
    Extension(state): Extension<AppState>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BatchStartResponse>)> {
    let Json(request) = body?;
    let (batch, _) = start_batch(&request.urls, request.name.as_deref(), state.deps.clone()).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(BatchStartResponse {
            id: batch.id,
            name: batch.name,
            total_urls: batch.total_urls,
            status: batch.status,
            message: "Batch analysis started successfully",
        }),
    ))
}

/// GET /api/batch/:id
pub async fn batch_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BatchDetail>> {
    let batch = find_batch(&state, &id).await?;
    let analyses = state
        .deps
        .store
        .analyses_by_batch(batch.id)
        .await
        .map_err(ApiError::internal("Failed to retrieve batch"))?;

    Ok(Json(BatchDetail {
        progress: batch.progress(),
        batch,
        analyses,
    }))
}

/// GET /api/batch/:id/export
pub async fn batch_export_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let batch = find_batch(&state, &id).await?;
    let analyses = state
        .deps
        .store
        .analyses_by_batch(batch.id)
        .await
        .map_err(ApiError::internal("Failed to export batch"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"batch-{}.csv\"", batch.id),
            ),
        ],
        batch_csv(&analyses),
    ))
}

/// GET /api/batches/recent?limit=N
pub async fn recent_batches_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<Batch>>> {
    let batches = state
        .deps
        .store
        .recent_batches(query.limit())
        .await
        .map_err(ApiError::internal("Failed to retrieve recent batches"))?;

    Ok(Json(batches))
}
