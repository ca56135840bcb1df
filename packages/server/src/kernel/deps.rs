//! Server dependencies for the analysis pipeline and coordinators
//!
//! Every external service sits behind a trait so tests can swap in the
//! doubles from `test_dependencies`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::store::RecordStore;
use super::{BaseContentSource, BaseJudge};

/// Dependencies shared by every pipeline run
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn RecordStore>,
    pub content_source: Arc<dyn BaseContentSource>,
    pub judge: Arc<dyn BaseJudge>,
    /// Deadline for the fetch and judge stages; `None` waits indefinitely.
    pub stage_timeout: Option<Duration>,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn RecordStore>,
        content_source: Arc<dyn BaseContentSource>,
        judge: Arc<dyn BaseJudge>,
    ) -> Self {
        Self {
            store,
            content_source,
            judge,
            stage_timeout: None,
        }
    }

    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Run `fut` under the stage deadline, if one is configured.
    ///
    /// Returns `None` when the deadline elapsed.
    pub async fn within_stage_deadline<F: Future>(&self, fut: F) -> Option<F::Output> {
        match self.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
            None => Some(fut.await),
        }
    }
}
