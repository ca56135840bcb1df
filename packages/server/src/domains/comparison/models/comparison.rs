use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{AnalysisId, ComparisonId, ContainerStatus};

pub type ComparisonStatus = ContainerStatus;

/// A baseline URL measured against competitors.
///
/// `analysis_ids[0]` is the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub id: ComparisonId,
    pub name: String,
    pub description: Option<String>,
    pub analysis_ids: Vec<AnalysisId>,
    pub status: ComparisonStatus,
    pub created_at: DateTime<Utc>,
}

impl Comparison {
    pub fn baseline_id(&self) -> Option<AnalysisId> {
        self.analysis_ids.first().copied()
    }
}

#[derive(Debug, Clone)]
pub struct NewComparison {
    pub name: String,
    pub description: Option<String>,
    pub analysis_ids: Vec<AnalysisId>,
}
