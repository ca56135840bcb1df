//! Test harness wiring the mock collaborators into a full set of server deps.
//!
//! Everything runs against the in-memory store, so no containers are needed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use fanout_core::common::{AnalysisId, BatchId, ComparisonId};
use fanout_core::domains::analysis::Analysis;
use fanout_core::domains::batch::Batch;
use fanout_core::domains::comparison::Comparison;
use fanout_core::kernel::{
    FailingStore, MockContentSource, MockJudge, RecordStore, ServerDeps, TestDependencies,
};
use fanout_core::server::build_app;
use test_context::AsyncTestContext;

/// How long `wait_for_*` polls before giving up.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Test harness holding the mocks and the `ServerDeps` built from them.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let analysis = start_analysis("https://example.com", ctx.deps()).await.unwrap();
///     let done = ctx.wait_for_analysis(analysis.id).await;
/// }
/// ```
pub struct TestHarness {
    pub mocks: TestDependencies,
    deps: Arc<ServerDeps>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {
        // Spawned pipelines hold their own Arc and finish on their own
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::from_mocks(TestDependencies::new())
    }

    pub fn with_mocks(content_source: MockContentSource, judge: MockJudge) -> Self {
        Self::from_mocks(TestDependencies::with_mocks(content_source, judge))
    }

    pub fn from_mocks(mocks: TestDependencies) -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let deps = Arc::new(mocks.server_deps());
        Self { mocks, deps }
    }

    /// Rebuild the deps with a stage deadline.
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.deps = Arc::new(self.mocks.server_deps().with_stage_timeout(Some(timeout)));
        self
    }

    /// Rebuild the deps so writes go through a `FailingStore` over the same memory store.
    ///
    /// `store()` keeps reading the unwrapped store.
    pub fn with_failing_store(
        mut self,
        configure: impl FnOnce(FailingStore) -> FailingStore,
    ) -> Self {
        let store = configure(FailingStore::new(self.mocks.store.clone()));
        self.deps = Arc::new(self.mocks.server_deps_with_store(Arc::new(store)));
        self
    }

    pub fn deps(&self) -> Arc<ServerDeps> {
        self.deps.clone()
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.mocks.store.as_ref()
    }

    /// The full HTTP router over these deps.
    pub fn app(&self) -> Router {
        build_app(self.deps())
    }

    /// Poll until the analysis reaches `completed` or `failed`.
    pub async fn wait_for_analysis(&self, id: AnalysisId) -> Analysis {
        poll_until("analysis", || async {
            self.store()
                .get_analysis(id)
                .await
                .expect("store read failed")
                .filter(|a| a.status.is_terminal())
        })
        .await
    }

    /// Poll until the batch reaches a terminal status.
    pub async fn wait_for_batch(&self, id: BatchId) -> Batch {
        poll_until("batch", || async {
            self.store()
                .get_batch(id)
                .await
                .expect("store read failed")
                .filter(|b| b.status.is_terminal())
        })
        .await
    }

    /// Poll until the comparison reaches a terminal status.
    pub async fn wait_for_comparison(&self, id: ComparisonId) -> Comparison {
        poll_until("comparison", || async {
            self.store()
                .get_comparison(id)
                .await
                .expect("store read failed")
                .filter(|c| c.status.is_terminal())
        })
        .await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

async fn poll_until<T, F, Fut>(what: &str, mut check: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let wait = async {
        loop {
            if let Some(value) = check().await {
                return value;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    };

    tokio::time::timeout(SETTLE_TIMEOUT, wait)
        .await
        .unwrap_or_else(|_| panic!("{} did not settle within {:?}", what, SETTLE_TIMEOUT))
}
