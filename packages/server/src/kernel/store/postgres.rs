use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{check_transition, RecordStore, StoreError};
use crate::common::{AnalysisId, BatchId, ComparisonId, QueryResult, SemanticChunk};
use crate::domains::analysis::models::{Analysis, AnalysisResults, AnalysisStatus, NewAnalysis};
use crate::domains::batch::models::{Batch, BatchProgress, NewBatch};
use crate::domains::comparison::models::{Comparison, ComparisonStatus, NewComparison};

/// Store backed by Postgres. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct AnalysisRow {
    id: i64,
    url: String,
    title: Option<String>,
    primary_entity: Option<String>,
    semantic_chunks: Option<i32>,
    query_coverage: Option<String>,
    coverage_score: Option<i32>,
    queries: Option<Json<Vec<QueryResult>>>,
    recommendations: Option<Json<Vec<String>>>,
    semantic_chunks_data: Option<Json<Vec<SemanticChunk>>>,
    status: String,
    batch_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for Analysis {
    type Error = anyhow::Error;

    fn try_from(row: AnalysisRow) -> Result<Self> {
        Ok(Analysis {
            id: AnalysisId(row.id),
            url: row.url,
            title: row.title,
            primary_entity: row.primary_entity,
            semantic_chunks: row.semantic_chunks,
            query_coverage: row.query_coverage,
            coverage_score: row.coverage_score,
            queries: row.queries.map(|j| j.0),
            recommendations: row.recommendations.map(|j| j.0),
            semantic_chunks_data: row.semantic_chunks_data.map(|j| j.0),
            status: row.status.parse()?,
            batch_id: row.batch_id.map(BatchId::from_uuid),
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct BatchRow {
    id: Uuid,
    name: String,
    total_urls: i32,
    completed_urls: i32,
    failed_urls: i32,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BatchRow> for Batch {
    type Error = anyhow::Error;

    fn try_from(row: BatchRow) -> Result<Self> {
        Ok(Batch {
            id: BatchId::from_uuid(row.id),
            name: row.name,
            total_urls: row.total_urls,
            completed_urls: row.completed_urls,
            failed_urls: row.failed_urls,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ComparisonRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    analysis_ids: Json<Vec<i64>>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ComparisonRow> for Comparison {
    type Error = anyhow::Error;

    fn try_from(row: ComparisonRow) -> Result<Self> {
        Ok(Comparison {
            id: ComparisonId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            analysis_ids: row.analysis_ids.0.into_iter().map(AnalysisId).collect(),
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = anyhow::Error>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl RecordStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn create_analysis(&self, input: NewAnalysis) -> Result<Analysis> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            "INSERT INTO analyses (url, batch_id, status) VALUES ($1, $2, 'pending') RETURNING *",
        )
        .bind(&input.url)
        .bind(input.batch_id.map(|id| id.into_uuid()))
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert analysis")?;

        row.try_into()
    }

    async fn get_analysis(&self, id: AnalysisId) -> Result<Option<Analysis>> {
        sqlx::query_as::<_, AnalysisRow>("SELECT * FROM analyses WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .map(Analysis::try_from)
            .transpose()
    }

    async fn transition_analysis(
        &self,
        id: AnalysisId,
        status: AnalysisStatus,
    ) -> Result<Analysis> {
        let current = self
            .get_analysis(id)
            .await?
            .ok_or_else(|| StoreError::analysis_not_found(id))?;
        check_transition(&current, status)?;

        // Guarded on the status we checked so a concurrent writer cannot be overwritten.
        let row = sqlx::query_as::<_, AnalysisRow>(
            "UPDATE analyses SET status = $3 WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(id.as_i64())
        .bind(current.status.as_str())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(StoreError::InvalidTransition {
                id,
                from: current.status,
                to: status,
            }
            .into()),
        }
    }

    async fn complete_analysis(
        &self,
        id: AnalysisId,
        results: AnalysisResults,
    ) -> Result<Analysis> {
        let current = self
            .get_analysis(id)
            .await?
            .ok_or_else(|| StoreError::analysis_not_found(id))?;
        check_transition(&current, AnalysisStatus::Completed)?;

        let row = sqlx::query_as::<_, AnalysisRow>(
            "UPDATE analyses
             SET title = $3, primary_entity = $4, semantic_chunks = $5,
                 query_coverage = $6, coverage_score = $7, queries = $8,
                 recommendations = $9, semantic_chunks_data = $10,
                 status = 'completed'
             WHERE id = $1 AND status = $2
             RETURNING *",
        )
        .bind(id.as_i64())
        .bind(current.status.as_str())
        .bind(&results.title)
        .bind(&results.primary_entity)
        .bind(results.semantic_chunks)
        .bind(&results.query_coverage)
        .bind(results.coverage_score)
        .bind(Json(&results.queries))
        .bind(Json(&results.recommendations))
        .bind(Json(&results.semantic_chunks_data))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(StoreError::InvalidTransition {
                id,
                from: current.status,
                to: AnalysisStatus::Completed,
            }
            .into()),
        }
    }

    async fn recent_analyses(&self, limit: i64) -> Result<Vec<Analysis>> {
        let rows = sqlx::query_as::<_, AnalysisRow>(
            "SELECT * FROM analyses ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn analyses_by_batch(&self, batch_id: BatchId) -> Result<Vec<Analysis>> {
        let rows = sqlx::query_as::<_, AnalysisRow>(
            "SELECT * FROM analyses WHERE batch_id = $1 ORDER BY id ASC",
        )
        .bind(batch_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn analyses_by_status(&self, status: AnalysisStatus) -> Result<Vec<Analysis>> {
        let rows = sqlx::query_as::<_, AnalysisRow>(
            "SELECT * FROM analyses WHERE status = $1 ORDER BY id ASC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn create_batch(&self, input: NewBatch) -> Result<Batch> {
        let row = sqlx::query_as::<_, BatchRow>(
            "INSERT INTO batches (id, name, total_urls, status)
             VALUES ($1, $2, $3, 'pending')
             RETURNING *",
        )
        .bind(BatchId::new().into_uuid())
        .bind(&input.name)
        .bind(input.total_urls)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert batch")?;

        row.try_into()
    }

    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>> {
        sqlx::query_as::<_, BatchRow>("SELECT * FROM batches WHERE id = $1")
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Batch::try_from)
            .transpose()
    }

    async fn update_batch(&self, id: BatchId, progress: BatchProgress) -> Result<Batch> {
        let current = self
            .get_batch(id)
            .await?
            .ok_or_else(|| StoreError::batch_not_found(id))?;
        let next = current.apply(&progress)?;

        let row = sqlx::query_as::<_, BatchRow>(
            "UPDATE batches
             SET completed_urls = $2, failed_urls = $3, status = $4
             WHERE id = $1
             RETURNING *",
        )
        .bind(id.into_uuid())
        .bind(next.completed_urls)
        .bind(next.failed_urls)
        .bind(next.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn recent_batches(&self, limit: i64) -> Result<Vec<Batch>> {
        let rows = sqlx::query_as::<_, BatchRow>(
            "SELECT * FROM batches ORDER BY created_at DESC, seq DESC LIMIT $1",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn create_comparison(&self, input: NewComparison) -> Result<Comparison> {
        let ids: Vec<i64> = input.analysis_ids.iter().map(|id| id.as_i64()).collect();

        let row = sqlx::query_as::<_, ComparisonRow>(
            "INSERT INTO comparisons (id, name, description, analysis_ids, status)
             VALUES ($1, $2, $3, $4, 'pending')
             RETURNING *",
        )
        .bind(ComparisonId::new().into_uuid())
        .bind(&input.name)
        .bind(&input.description)
        .bind(Json(ids))
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert comparison")?;

        row.try_into()
    }

    async fn get_comparison(&self, id: ComparisonId) -> Result<Option<Comparison>> {
        sqlx::query_as::<_, ComparisonRow>("SELECT * FROM comparisons WHERE id = $1")
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Comparison::try_from)
            .transpose()
    }

    async fn set_comparison_status(
        &self,
        id: ComparisonId,
        status: ComparisonStatus,
    ) -> Result<Comparison> {
        sqlx::query_as::<_, ComparisonRow>(
            "UPDATE comparisons SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id.into_uuid())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::comparison_not_found(id))?
        .try_into()
    }

    async fn recent_comparisons(&self, limit: i64) -> Result<Vec<Comparison>> {
        let rows = sqlx::query_as::<_, ComparisonRow>(
            "SELECT * FROM comparisons ORDER BY created_at DESC, seq DESC LIMIT $1",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    async fn connect() -> PostgresStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to test database");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("run migrations");
        PostgresStore::new(pool)
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_transitions_are_enforced() {
        let store = connect().await;
        let a = store
            .create_analysis(NewAnalysis::new("https://example.com"))
            .await
            .unwrap();

        assert!(store
            .transition_analysis(a.id, AnalysisStatus::Chunking)
            .await
            .is_err());
        let scraping = store
            .transition_analysis(a.id, AnalysisStatus::Scraping)
            .await
            .unwrap();
        assert_eq!(scraping.status, AnalysisStatus::Scraping);
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_comparison_keeps_analysis_order() {
        let store = connect().await;
        let comparison = store
            .create_comparison(NewComparison {
                name: "c".to_string(),
                description: None,
                analysis_ids: vec![AnalysisId(3), AnalysisId(1), AnalysisId(2)],
            })
            .await
            .unwrap();

        let loaded = store.get_comparison(comparison.id).await.unwrap().unwrap();
        assert_eq!(
            loaded.analysis_ids,
            vec![AnalysisId(3), AnalysisId(1), AnalysisId(2)]
        );
        assert_eq!(loaded.baseline_id(), Some(AnalysisId(3)));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_recent_batches_break_timestamp_ties_by_insertion() {
        let store = connect().await;
        let mut ids = Vec::new();
        for name in ["first", "second", "third"] {
            let batch = store
                .create_batch(NewBatch {
                    name: name.to_string(),
                    total_urls: 1,
                })
                .await
                .unwrap();
            ids.push(batch.id.into_uuid());
        }

        // Same instant for all three, ahead of anything else in the table
        let tied = Utc::now() + chrono::Duration::days(365 * 100);
        sqlx::query("UPDATE batches SET created_at = $1 WHERE id = ANY($2)")
            .bind(tied)
            .bind(&ids[..])
            .execute(store.pool())
            .await
            .unwrap();

        let recent = store.recent_batches(3).await.unwrap();
        let names: Vec<&str> = recent.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_recent_comparisons_break_timestamp_ties_by_insertion() {
        let store = connect().await;
        let mut ids = Vec::new();
        for name in ["first", "second"] {
            let comparison = store
                .create_comparison(NewComparison {
                    name: name.to_string(),
                    description: None,
                    analysis_ids: vec![AnalysisId(1), AnalysisId(2)],
                })
                .await
                .unwrap();
            ids.push(comparison.id.into_uuid());
        }

        let tied = Utc::now() + chrono::Duration::days(365 * 100);
        sqlx::query("UPDATE comparisons SET created_at = $1 WHERE id = ANY($2)")
            .bind(tied)
            .bind(&ids[..])
            .execute(store.pool())
            .await
            .unwrap();

        let recent = store.recent_comparisons(2).await.unwrap();
        let names: Vec<&str> = recent.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["second", "first"]);
    }
}
