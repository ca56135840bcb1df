// TestDependencies - mock implementations for testing
//
// Mock content source, judge and store wrapper that can be injected into ServerDeps.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::{FetchError, JudgeError};
use super::store::{MemoryStore, RecordStore};
use super::{BaseContentSource, BaseJudge, Judgment, ScrapedPage, ServerDeps};
use crate::common::{AnalysisId, BatchId, ComparisonId, Coverage, QueryResult, SemanticChunk};
use crate::domains::analysis::models::{Analysis, AnalysisResults, AnalysisStatus, NewAnalysis};
use crate::domains::batch::models::{Batch, BatchProgress, BatchStatus, NewBatch};
use crate::domains::comparison::models::{Comparison, ComparisonStatus, NewComparison};

// =============================================================================
// Mock Content Source
// =============================================================================

pub struct MockContentSource {
    pages: Arc<Mutex<HashMap<String, ScrapedPage>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockContentSource {
    pub fn new() -> Self {
        Self {
            pages: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serve a specific page for `url`
    pub fn with_page(self, url: &str, title: &str, content: &str) -> Self {
        self.pages.lock().unwrap().insert(
            url.to_string(),
            ScrapedPage {
                url: url.to_string(),
                title: title.to_string(),
                content: content.to_string(),
            },
        );
        self
    }

    /// Fail every fetch of `url` with a 404
    pub fn with_failure(self, url: &str) -> Self {
        self.failing.lock().unwrap().insert(url.to_string());
        self
    }

    /// Hold each fetch open for `delay` so overlapping calls can be observed
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs fetched, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn was_fetched(&self, url: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|u| u == url)
    }

    /// Most fetches that were ever in flight at once
    pub fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockContentSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseContentSource for MockContentSource {
    async fn fetch(&self, url: &str) -> Result<ScrapedPage, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(url) {
            return Err(FetchError::PageNotFound);
        }

        let page = self.pages.lock().unwrap().get(url).cloned();
        Ok(page.unwrap_or_else(|| ScrapedPage {
            url: url.to_string(),
            title: format!("Page: {}", url),
            content: default_content(),
        }))
    }
}

fn default_content() -> String {
    [
        "This mock page explains the topic in enough depth that the chunker keeps the \
         paragraph as a section, with more than one hundred characters of body text.",
        "How to get started: a second paragraph that walks through the first steps and \
         is long enough to survive the length filter as well.",
    ]
    .join("\n\n")
}

// =============================================================================
// Mock Judge
// =============================================================================

/// Arguments captured from a judge call
#[derive(Debug, Clone)]
pub struct JudgeCallArgs {
    pub title: String,
    pub content: String,
    pub chunk_count: usize,
}

pub struct MockJudge {
    responses: Arc<Mutex<Vec<Judgment>>>,
    by_title: Arc<Mutex<HashMap<String, Judgment>>>,
    failing_titles: Arc<Mutex<HashSet<String>>>,
    panicking_titles: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<JudgeCallArgs>>>,
    delay: Option<Duration>,
}

impl MockJudge {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            by_title: Arc::new(Mutex::new(HashMap::new())),
            failing_titles: Arc::new(Mutex::new(HashSet::new())),
            panicking_titles: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Queue a judgment; queued judgments are returned in order
    pub fn with_response(self, judgment: Judgment) -> Self {
        self.responses.lock().unwrap().push(judgment);
        self
    }

    /// Return `judgment` whenever the page title matches
    pub fn with_judgment_for(self, title: &str, judgment: Judgment) -> Self {
        self.by_title
            .lock()
            .unwrap()
            .insert(title.to_string(), judgment);
        self
    }

    /// Fail with an upstream error whenever the page title matches
    pub fn with_failure_for(self, title: &str) -> Self {
        self.failing_titles.lock().unwrap().insert(title.to_string());
        self
    }

    /// Panic instead of answering whenever the page title matches
    pub fn with_panic_for(self, title: &str) -> Self {
        self.panicking_titles
            .lock()
            .unwrap()
            .insert(title.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<JudgeCallArgs> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockJudge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseJudge for MockJudge {
    async fn judge(
        &self,
        title: &str,
        content: &str,
        chunks: &[SemanticChunk],
    ) -> Result<Judgment, JudgeError> {
        self.calls.lock().unwrap().push(JudgeCallArgs {
            title: title.to_string(),
            content: content.to_string(),
            chunk_count: chunks.len(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let panics = self.panicking_titles.lock().unwrap().contains(title);
        if panics {
            panic!("mock judge blew up on {}", title);
        }
        if self.failing_titles.lock().unwrap().contains(title) {
            return Err(JudgeError::Api("500 Internal Server Error: mock".to_string()));
        }
        if let Some(judgment) = self.by_title.lock().unwrap().get(title).cloned() {
            return Ok(judgment);
        }

        let mut responses = self.responses.lock().unwrap();
        if !responses.is_empty() {
            Ok(responses.remove(0))
        } else {
            Ok(sample_judgment())
        }
    }
}

/// A judgment with three queries: one of each coverage level.
pub fn sample_judgment() -> Judgment {
    Judgment {
        primary_entity: "Mock Topic".to_string(),
        queries: vec![
            QueryResult::new("what is mock topic", "Definition", Coverage::Yes),
            QueryResult::new("how to use mock topic", "Usage steps", Coverage::Partial),
            QueryResult::new("mock topic pricing", "Cost details", Coverage::No),
        ],
        recommendations: vec!["Add a pricing section".to_string()],
        coverage_score: 6.6,
    }
}

// =============================================================================
// Failing Store
// =============================================================================

/// `MemoryStore` wrapper that rejects selected container writes.
///
/// Reads and every other write go straight through to the inner store, so a
/// test can keep inspecting records through the `MemoryStore` it holds.
pub struct FailingStore {
    inner: Arc<MemoryStore>,
    batch_status: Option<BatchStatus>,
    batch_counts: bool,
    comparison_status: Option<ComparisonStatus>,
}

impl FailingStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            batch_status: None,
            batch_counts: false,
            comparison_status: None,
        }
    }

    /// Reject batch updates that set `status`
    pub fn fail_batch_status(mut self, status: BatchStatus) -> Self {
        self.batch_status = Some(status);
        self
    }

    /// Reject batch updates that only move the counters
    pub fn fail_batch_counts(mut self) -> Self {
        self.batch_counts = true;
        self
    }

    /// Reject comparison updates that set `status`
    pub fn fail_comparison_status(mut self, status: ComparisonStatus) -> Self {
        self.comparison_status = Some(status);
        self
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn create_analysis(&self, input: NewAnalysis) -> anyhow::Result<Analysis> {
        self.inner.create_analysis(input).await
    }

    async fn get_analysis(&self, id: AnalysisId) -> anyhow::Result<Option<Analysis>> {
        self.inner.get_analysis(id).await
    }

    async fn transition_analysis(
        &self,
        id: AnalysisId,
        status: AnalysisStatus,
    ) -> anyhow::Result<Analysis> {
        self.inner.transition_analysis(id, status).await
    }

    async fn complete_analysis(
        &self,
        id: AnalysisId,
        results: AnalysisResults,
    ) -> anyhow::Result<Analysis> {
        self.inner.complete_analysis(id, results).await
    }

    async fn recent_analyses(&self, limit: i64) -> anyhow::Result<Vec<Analysis>> {
        self.inner.recent_analyses(limit).await
    }

    async fn analyses_by_batch(&self, batch_id: BatchId) -> anyhow::Result<Vec<Analysis>> {
        self.inner.analyses_by_batch(batch_id).await
    }

    async fn analyses_by_status(&self, status: AnalysisStatus) -> anyhow::Result<Vec<Analysis>> {
        self.inner.analyses_by_status(status).await
    }

    async fn create_batch(&self, input: NewBatch) -> anyhow::Result<Batch> {
        self.inner.create_batch(input).await
    }

    async fn get_batch(&self, id: BatchId) -> anyhow::Result<Option<Batch>> {
        self.inner.get_batch(id).await
    }

    async fn update_batch(&self, id: BatchId, progress: BatchProgress) -> anyhow::Result<Batch> {
        let rejected = match progress.status {
            Some(status) => self.batch_status == Some(status),
            None => self.batch_counts,
        };
        if rejected {
            anyhow::bail!("mock store rejected update of batch {}", id);
        }
        self.inner.update_batch(id, progress).await
    }

    async fn recent_batches(&self, limit: i64) -> anyhow::Result<Vec<Batch>> {
        self.inner.recent_batches(limit).await
    }

    async fn create_comparison(&self, input: NewComparison) -> anyhow::Result<Comparison> {
        self.inner.create_comparison(input).await
    }

    async fn get_comparison(&self, id: ComparisonId) -> anyhow::Result<Option<Comparison>> {
        self.inner.get_comparison(id).await
    }

    async fn set_comparison_status(
        &self,
        id: ComparisonId,
        status: ComparisonStatus,
    ) -> anyhow::Result<Comparison> {
        if self.comparison_status == Some(status) {
            anyhow::bail!("mock store rejected {} for comparison {}", status, id);
        }
        self.inner.set_comparison_status(id, status).await
    }

    async fn recent_comparisons(&self, limit: i64) -> anyhow::Result<Vec<Comparison>> {
        self.inner.recent_comparisons(limit).await
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Mock collaborators plus the `ServerDeps` wired to them.
pub struct TestDependencies {
    pub store: Arc<MemoryStore>,
    pub content_source: Arc<MockContentSource>,
    pub judge: Arc<MockJudge>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self::with_mocks(MockContentSource::new(), MockJudge::new())
    }

    pub fn with_mocks(content_source: MockContentSource, judge: MockJudge) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            content_source: Arc::new(content_source),
            judge: Arc::new(judge),
        }
    }

    pub fn server_deps(&self) -> ServerDeps {
        self.server_deps_with_store(self.store.clone())
    }

    /// Deps wired to the mocks but writing through `store`
    pub fn server_deps_with_store(&self, store: Arc<dyn RecordStore>) -> ServerDeps {
        ServerDeps::new(store, self.content_source.clone(), self.judge.clone())
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
