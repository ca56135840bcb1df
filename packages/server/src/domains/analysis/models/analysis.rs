use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::{AnalysisId, BatchId, QueryResult, SemanticChunk};

/// Where one URL is in the pipeline.
///
/// Moves strictly forward through
/// `pending -> scraping -> chunking -> analyzing -> completed`; `failed` is
/// reachable from any non-terminal state. `completed` and `failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Pending,
    Scraping,
    Chunking,
    Analyzing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    /// Position along the pipeline; `None` for `failed`.
    fn stage(self) -> Option<u8> {
        match self {
            AnalysisStatus::Pending => Some(0),
            AnalysisStatus::Scraping => Some(1),
            AnalysisStatus::Chunking => Some(2),
            AnalysisStatus::Analyzing => Some(3),
            AnalysisStatus::Completed => Some(4),
            AnalysisStatus::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }

    /// Whether a record in `self` may move to `next`.
    pub fn can_transition_to(self, next: AnalysisStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.stage(), next.stage()) {
            (_, None) => true,
            (Some(from), Some(to)) => to == from + 1,
            (None, Some(_)) => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Scraping => "scraping",
            AnalysisStatus::Chunking => "chunking",
            AnalysisStatus::Analyzing => "analyzing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(AnalysisStatus::Pending),
            "scraping" => Ok(AnalysisStatus::Scraping),
            "chunking" => Ok(AnalysisStatus::Chunking),
            "analyzing" => Ok(AnalysisStatus::Analyzing),
            "completed" => Ok(AnalysisStatus::Completed),
            "failed" => Ok(AnalysisStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid analysis status: {}", s)),
        }
    }
}

/// One URL's run through the pipeline and, once completed, its report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: AnalysisId,
    pub url: String,
    pub title: Option<String>,
    pub primary_entity: Option<String>,
    /// Number of semantic chunks detected
    pub semantic_chunks: Option<i32>,
    /// "<yes>/<total>" over the judged queries
    pub query_coverage: Option<String>,
    pub coverage_score: Option<i32>,
    pub queries: Option<Vec<QueryResult>>,
    pub recommendations: Option<Vec<String>>,
    pub semantic_chunks_data: Option<Vec<SemanticChunk>>,
    pub status: AnalysisStatus,
    pub batch_id: Option<BatchId>,
    pub created_at: DateTime<Utc>,
}

impl Analysis {
    pub fn is_completed(&self) -> bool {
        self.status == AnalysisStatus::Completed
    }

    /// Judged queries, empty until completed.
    pub fn query_results(&self) -> &[QueryResult] {
        self.queries.as_deref().unwrap_or_default()
    }

    /// Write a finished report into the record.
    pub(crate) fn apply_results(&mut self, results: AnalysisResults) {
        self.title = Some(results.title);
        self.primary_entity = Some(results.primary_entity);
        self.semantic_chunks = Some(results.semantic_chunks);
        self.query_coverage = Some(results.query_coverage);
        self.coverage_score = Some(results.coverage_score);
        self.queries = Some(results.queries);
        self.recommendations = Some(results.recommendations);
        self.semantic_chunks_data = Some(results.semantic_chunks_data);
        self.status = AnalysisStatus::Completed;
    }
}

/// Input for creating a pending analysis.
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub url: String,
    pub batch_id: Option<BatchId>,
}

impl NewAnalysis {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            batch_id: None,
        }
    }

    pub fn in_batch(url: impl Into<String>, batch_id: BatchId) -> Self {
        Self {
            url: url.into(),
            batch_id: Some(batch_id),
        }
    }
}

/// Every result field of a completed analysis, written in one update.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResults {
    pub title: String,
    pub primary_entity: String,
    pub semantic_chunks: i32,
    pub query_coverage: String,
    pub coverage_score: i32,
    pub queries: Vec<QueryResult>,
    pub recommendations: Vec<String>,
    pub semantic_chunks_data: Vec<SemanticChunk>,
}
