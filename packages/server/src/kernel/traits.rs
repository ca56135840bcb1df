// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The analysis pipeline lives in domains/analysis and calls through these.
//
// Naming convention: Base* for trait names (e.g., BaseContentSource, BaseJudge)

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::{FetchError, JudgeError};
use crate::common::{QueryResult, SemanticChunk};

// =============================================================================
// Content Source (fetch + clean one URL)
// =============================================================================

/// Cleaned text of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedPage {
    pub url: String,
    pub title: String,
    pub content: String,
}

#[async_trait]
pub trait BaseContentSource: Send + Sync {
    /// Fetch a page and return its title and main text.
    async fn fetch(&self, url: &str) -> Result<ScrapedPage, FetchError>;
}

// =============================================================================
// Judgment (external reasoning model)
// =============================================================================

/// Structured verdict on how a page fans out into sub-queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Judgment {
    /// The main ontological topic of the page
    pub primary_entity: String,
    /// 8-10 predicted sub-queries with coverage labels
    pub queries: Vec<QueryResult>,
    /// Specific optimization recommendations
    pub recommendations: Vec<String>,
    /// Overall coverage score between 0 and 10
    pub coverage_score: f64,
}

#[async_trait]
pub trait BaseJudge: Send + Sync {
    /// Classify the page's sub-queries and their coverage.
    async fn judge(
        &self,
        title: &str,
        content: &str,
        chunks: &[SemanticChunk],
    ) -> Result<Judgment, JudgeError>;
}
