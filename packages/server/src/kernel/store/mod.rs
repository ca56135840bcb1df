//! Record store for analyses, batches and comparisons.
//!
//! Business logic only talks to `RecordStore`; the backing is chosen at start-up
//! (`MemoryStore` without a database, `PostgresStore` with one).

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::common::{AnalysisId, BatchId, ComparisonId};
use crate::domains::analysis::models::{Analysis, AnalysisResults, AnalysisStatus, NewAnalysis};
use crate::domains::batch::models::{Batch, BatchProgress, NewBatch};
use crate::domains::comparison::models::{Comparison, ComparisonStatus, NewComparison};

/// Limit used by the recent listings when the caller gives none.
pub const DEFAULT_RECENT_LIMIT: i64 = 10;

/// Rule violations raised by either backing.
///
/// Returned inside `anyhow::Error`; callers that care can downcast.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Analysis {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: AnalysisId,
        from: AnalysisStatus,
        to: AnalysisStatus,
    },

    #[error("Batch {id} counters out of range: {settled} settled of {total}")]
    CounterOutOfRange { id: String, settled: i32, total: i32 },

    #[error("Batch {id} cannot complete with {settled} of {total} items settled")]
    Unsettled { id: String, settled: i32, total: i32 },
}

impl StoreError {
    pub fn analysis_not_found(id: AnalysisId) -> Self {
        StoreError::NotFound {
            kind: "Analysis",
            id: id.to_string(),
        }
    }

    pub fn batch_not_found(id: BatchId) -> Self {
        StoreError::NotFound {
            kind: "Batch",
            id: id.to_string(),
        }
    }

    pub fn comparison_not_found(id: ComparisonId) -> Self {
        StoreError::NotFound {
            kind: "Comparison",
            id: id.to_string(),
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short name of the backing, reported by the health route.
    fn backend(&self) -> &'static str;

    // Analyses

    async fn create_analysis(&self, input: NewAnalysis) -> Result<Analysis>;

    async fn get_analysis(&self, id: AnalysisId) -> Result<Option<Analysis>>;

    /// Move an analysis to `status`, rejecting anything
    /// `AnalysisStatus::can_transition_to` forbids.
    async fn transition_analysis(&self, id: AnalysisId, status: AnalysisStatus)
        -> Result<Analysis>;

    /// Write every result field and mark the analysis completed.
    async fn complete_analysis(&self, id: AnalysisId, results: AnalysisResults)
        -> Result<Analysis>;

    /// Newest first.
    async fn recent_analyses(&self, limit: i64) -> Result<Vec<Analysis>>;

    /// In creation order.
    async fn analyses_by_batch(&self, batch_id: BatchId) -> Result<Vec<Analysis>>;

    async fn analyses_by_status(&self, status: AnalysisStatus) -> Result<Vec<Analysis>>;

    // Batches

    async fn create_batch(&self, input: NewBatch) -> Result<Batch>;

    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>>;

    async fn update_batch(&self, id: BatchId, progress: BatchProgress) -> Result<Batch>;

    async fn recent_batches(&self, limit: i64) -> Result<Vec<Batch>>;

    // Comparisons

    async fn create_comparison(&self, input: NewComparison) -> Result<Comparison>;

    async fn get_comparison(&self, id: ComparisonId) -> Result<Option<Comparison>>;

    async fn set_comparison_status(
        &self,
        id: ComparisonId,
        status: ComparisonStatus,
    ) -> Result<Comparison>;

    async fn recent_comparisons(&self, limit: i64) -> Result<Vec<Comparison>>;
}

/// Check a transition before writing it.
pub(crate) fn check_transition(
    analysis: &Analysis,
    to: AnalysisStatus,
) -> Result<(), StoreError> {
    if analysis.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(StoreError::InvalidTransition {
            id: analysis.id,
            from: analysis.status,
            to,
        })
    }
}
