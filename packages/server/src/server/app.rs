//! Application setup and router configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{
    analysis_export_handler, analysis_handler, analyze_handler, batch_export_handler,
    batch_handler, batch_start_handler, compare_handler, comparison_handler, health_handler,
    recent_analyses_handler, recent_batches_handler, recent_comparisons_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the Axum application router
pub fn build_app(deps: Arc<ServerDeps>) -> Router {
    let app_state = AppState { deps };

    // CORS configuration - allow any origin; the API carries no credentials
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(health_handler))
        // Single analyses
        .route("/api/analyze", post(analyze_handler))
        .route("/api/analysis/:id", get(analysis_handler))
        .route("/api/analysis/:id/export", get(analysis_export_handler))
        .route("/api/analyses/recent", get(recent_analyses_handler))
        // Batches
        .route("/api/analyze/batch", post(batch_start_handler))
        .route("/api/batch/:id", get(batch_handler))
        .route("/api/batch/:id/export", get(batch_export_handler))
        .route("/api/batches/recent", get(recent_batches_handler))
        // Comparisons
        .route("/api/compare", post(compare_handler))
        .route("/api/comparison/:id", get(comparison_handler))
        .route("/api/comparisons/recent", get(recent_comparisons_handler))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
