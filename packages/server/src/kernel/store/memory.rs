use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::{check_transition, RecordStore, StoreError};
use crate::common::{AnalysisId, BatchId, ComparisonId};
use crate::domains::analysis::models::{Analysis, AnalysisResults, AnalysisStatus, NewAnalysis};
use crate::domains::batch::models::{Batch, BatchProgress, BatchStatus, NewBatch};
use crate::domains::comparison::models::{Comparison, ComparisonStatus, NewComparison};

/// Process-local store. Records are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    analyses: RwLock<IndexMap<AnalysisId, Analysis>>,
    next_analysis_id: RwLock<i64>,
    batches: RwLock<IndexMap<BatchId, Batch>>,
    comparisons: RwLock<IndexMap<ComparisonId, Comparison>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first, ties broken by reverse insertion order.
fn newest_first<T: Clone>(
    records: impl DoubleEndedIterator<Item = T>,
    created_at: impl Fn(&T) -> chrono::DateTime<Utc>,
    limit: i64,
) -> Vec<T> {
    let mut items: Vec<T> = records.rev().collect();
    items.sort_by_key(|r| std::cmp::Reverse(created_at(r)));
    items.truncate(usize::try_from(limit.max(0)).unwrap_or(0));
    items
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create_analysis(&self, input: NewAnalysis) -> Result<Analysis> {
        let id = {
            let mut next = self.next_analysis_id.write().await;
            *next += 1;
            AnalysisId(*next)
        };

        let analysis = Analysis {
            id,
            url: input.url,
            title: None,
            primary_entity: None,
            semantic_chunks: None,
            query_coverage: None,
            coverage_score: None,
            queries: None,
            recommendations: None,
            semantic_chunks_data: None,
            status: AnalysisStatus::Pending,
            batch_id: input.batch_id,
            created_at: Utc::now(),
        };

        self.analyses.write().await.insert(id, analysis.clone());
        Ok(analysis)
    }

    async fn get_analysis(&self, id: AnalysisId) -> Result<Option<Analysis>> {
        Ok(self.analyses.read().await.get(&id).cloned())
    }

    async fn transition_analysis(
        &self,
        id: AnalysisId,
        status: AnalysisStatus,
    ) -> Result<Analysis> {
        let mut analyses = self.analyses.write().await;
        let analysis = analyses
            .get_mut(&id)
            .ok_or_else(|| StoreError::analysis_not_found(id))?;

        check_transition(analysis, status)?;
        analysis.status = status;
        Ok(analysis.clone())
    }

    async fn complete_analysis(
        &self,
        id: AnalysisId,
        results: AnalysisResults,
    ) -> Result<Analysis> {
        let mut analyses = self.analyses.write().await;
        let analysis = analyses
            .get_mut(&id)
            .ok_or_else(|| StoreError::analysis_not_found(id))?;

        check_transition(analysis, AnalysisStatus::Completed)?;
        analysis.apply_results(results);
        Ok(analysis.clone())
    }

    async fn recent_analyses(&self, limit: i64) -> Result<Vec<Analysis>> {
        let analyses = self.analyses.read().await;
        Ok(newest_first(analyses.values().cloned(), |a| a.created_at, limit))
    }

    async fn analyses_by_batch(&self, batch_id: BatchId) -> Result<Vec<Analysis>> {
        let analyses = self.analyses.read().await;
        Ok(analyses
            .values()
            .filter(|a| a.batch_id == Some(batch_id))
            .cloned()
            .collect())
    }

    async fn analyses_by_status(&self, status: AnalysisStatus) -> Result<Vec<Analysis>> {
        let analyses = self.analyses.read().await;
        Ok(analyses
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect())
    }

    async fn create_batch(&self, input: NewBatch) -> Result<Batch> {
        let batch = Batch {
            id: BatchId::new(),
            name: input.name,
            total_urls: input.total_urls,
            completed_urls: 0,
            failed_urls: 0,
            status: BatchStatus::Pending,
            created_at: Utc::now(),
        };

        self.batches.write().await.insert(batch.id, batch.clone());
        Ok(batch)
    }

    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>> {
        Ok(self.batches.read().await.get(&id).cloned())
    }

    async fn update_batch(&self, id: BatchId, progress: BatchProgress) -> Result<Batch> {
        let mut batches = self.batches.write().await;
        let batch = batches
            .get_mut(&id)
            .ok_or_else(|| StoreError::batch_not_found(id))?;

        *batch = batch.apply(&progress)?;
        Ok(batch.clone())
    }

    async fn recent_batches(&self, limit: i64) -> Result<Vec<Batch>> {
        let batches = self.batches.read().await;
        Ok(newest_first(batches.values().cloned(), |b| b.created_at, limit))
    }

    async fn create_comparison(&self, input: NewComparison) -> Result<Comparison> {
        let comparison = Comparison {
            id: ComparisonId::new(),
            name: input.name,
            description: input.description,
            analysis_ids: input.analysis_ids,
            status: ComparisonStatus::Pending,
            created_at: Utc::now(),
        };

        self.comparisons
            .write()
            .await
            .insert(comparison.id, comparison.clone());
        Ok(comparison)
    }

    async fn get_comparison(&self, id: ComparisonId) -> Result<Option<Comparison>> {
        Ok(self.comparisons.read().await.get(&id).cloned())
    }

    async fn set_comparison_status(
        &self,
        id: ComparisonId,
        status: ComparisonStatus,
    ) -> Result<Comparison> {
        let mut comparisons = self.comparisons.write().await;
        let comparison = comparisons
            .get_mut(&id)
            .ok_or_else(|| StoreError::comparison_not_found(id))?;

        comparison.status = status;
        Ok(comparison.clone())
    }

    async fn recent_comparisons(&self, limit: i64) -> Result<Vec<Comparison>> {
        let comparisons = self.comparisons.read().await;
        Ok(newest_first(comparisons.values().cloned(), |c| c.created_at, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Coverage, QueryResult};

    fn results() -> AnalysisResults {
        AnalysisResults {
            title: "Title".to_string(),
            primary_entity: "Entity".to_string(),
            semantic_chunks: 1,
            query_coverage: "1/1".to_string(),
            coverage_score: 8,
            queries: vec![QueryResult::new("q", "d", Coverage::Yes)],
            recommendations: vec![],
            semantic_chunks_data: vec![],
        }
    }

    #[tokio::test]
    async fn test_analysis_ids_are_sequential() {
        let store = MemoryStore::new();
        let a = store.create_analysis(NewAnalysis::new("https://a.com")).await.unwrap();
        let b = store.create_analysis(NewAnalysis::new("https://b.com")).await.unwrap();

        assert_eq!(a.id, AnalysisId(1));
        assert_eq!(b.id, AnalysisId(2));
        assert_eq!(a.status, AnalysisStatus::Pending);
    }

    #[tokio::test]
    async fn test_rejects_skipping_to_completed() {
        let store = MemoryStore::new();
        let a = store.create_analysis(NewAnalysis::new("https://a.com")).await.unwrap();

        let err = store.complete_analysis(a.id, results()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::InvalidTransition { .. })
        ));

        let unchanged = store.get_analysis(a.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, AnalysisStatus::Pending);
        assert!(unchanged.title.is_none());
    }

    #[tokio::test]
    async fn test_completion_writes_every_result_field() {
        let store = MemoryStore::new();
        let a = store.create_analysis(NewAnalysis::new("https://a.com")).await.unwrap();
        for status in [
            AnalysisStatus::Scraping,
            AnalysisStatus::Chunking,
            AnalysisStatus::Analyzing,
        ] {
            store.transition_analysis(a.id, status).await.unwrap();
        }

        let done = store.complete_analysis(a.id, results()).await.unwrap();
        assert_eq!(done.status, AnalysisStatus::Completed);
        assert_eq!(done.title.as_deref(), Some("Title"));
        assert_eq!(done.coverage_score, Some(8));
        assert_eq!(done.query_coverage.as_deref(), Some("1/1"));

        assert!(store
            .transition_analysis(a.id, AnalysisStatus::Failed)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .create_analysis(NewAnalysis::new(format!("https://{}.com", i)))
                .await
                .unwrap();
        }

        let recent = store.recent_analyses(3).await.unwrap();
        let ids: Vec<i64> = recent.iter().map(|a| a.id.as_i64()).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }

    #[tokio::test]
    async fn test_analyses_by_batch_keeps_creation_order() {
        let store = MemoryStore::new();
        let batch = store
            .create_batch(NewBatch {
                name: "b".to_string(),
                total_urls: 2,
            })
            .await
            .unwrap();

        store
            .create_analysis(NewAnalysis::in_batch("https://a.com", batch.id))
            .await
            .unwrap();
        store.create_analysis(NewAnalysis::new("https://solo.com")).await.unwrap();
        store
            .create_analysis(NewAnalysis::in_batch("https://b.com", batch.id))
            .await
            .unwrap();

        let urls: Vec<String> = store
            .analyses_by_batch(batch.id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.url)
            .collect();
        assert_eq!(urls, vec!["https://a.com", "https://b.com"]);
    }

    #[tokio::test]
    async fn test_update_batch_rejects_overflow() {
        let store = MemoryStore::new();
        let batch = store
            .create_batch(NewBatch {
                name: "b".to_string(),
                total_urls: 1,
            })
            .await
            .unwrap();

        assert!(store
            .update_batch(batch.id, BatchProgress::counts(1, 1))
            .await
            .is_err());
        let stored = store.get_batch(batch.id).await.unwrap().unwrap();
        assert_eq!(stored.completed_urls, 0);
    }

    #[tokio::test]
    async fn test_missing_records() {
        let store = MemoryStore::new();
        assert!(store.get_analysis(AnalysisId(42)).await.unwrap().is_none());
        assert!(store.get_batch(BatchId::new()).await.unwrap().is_none());
        assert!(store
            .set_comparison_status(ComparisonId::new(), ComparisonStatus::Processing)
            .await
            .is_err());
    }
}
