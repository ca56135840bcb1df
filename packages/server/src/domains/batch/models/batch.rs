use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{BatchId, ContainerStatus};
use crate::kernel::store::StoreError;

pub type BatchStatus = ContainerStatus;

/// A named group of URLs analysed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: BatchId,
    pub name: String,
    pub total_urls: i32,
    pub completed_urls: i32,
    pub failed_urls: i32,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    /// Settled items as a percentage of the total.
    ///
    /// 100 once completed and 0 once failed.
    pub fn progress(&self) -> i32 {
        match self.status {
            BatchStatus::Completed => 100,
            BatchStatus::Failed => 0,
            _ if self.total_urls <= 0 => 0,
            _ => {
                let settled = f64::from(self.completed_urls + self.failed_urls);
                (settled / f64::from(self.total_urls) * 100.0).round() as i32
            }
        }
    }

    /// Apply a progress update, keeping the counters within the total.
    ///
    /// A batch may only be marked completed once every item has settled.
    pub fn apply(&self, update: &BatchProgress) -> Result<Batch, StoreError> {
        let mut next = self.clone();
        if let Some(completed) = update.completed_urls {
            next.completed_urls = completed;
        }
        if let Some(failed) = update.failed_urls {
            next.failed_urls = failed;
        }
        if let Some(status) = update.status {
            next.status = status;
        }

        let settled = next.completed_urls + next.failed_urls;
        if next.completed_urls < 0 || next.failed_urls < 0 || settled > next.total_urls {
            return Err(StoreError::CounterOutOfRange {
                id: self.id.to_string(),
                settled,
                total: next.total_urls,
            });
        }
        if next.status == BatchStatus::Completed && settled != next.total_urls {
            return Err(StoreError::Unsettled {
                id: self.id.to_string(),
                settled,
                total: next.total_urls,
            });
        }

        Ok(next)
    }
}

/// Input for creating a pending batch.
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub name: String,
    pub total_urls: i32,
}

/// Partial update of a batch's counters and status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed_urls: Option<i32>,
    pub failed_urls: Option<i32>,
    pub status: Option<BatchStatus>,
}

impl BatchProgress {
    pub fn status(status: BatchStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn counts(completed_urls: i32, failed_urls: i32) -> Self {
        Self {
            completed_urls: Some(completed_urls),
            failed_urls: Some(failed_urls),
            status: None,
        }
    }

    pub fn finished(completed_urls: i32, failed_urls: i32) -> Self {
        Self {
            completed_urls: Some(completed_urls),
            failed_urls: Some(failed_urls),
            status: Some(BatchStatus::Completed),
        }
    }
}
