//! Identifier types for the three record kinds.
//!
//! Batches and comparisons use typed UUIDs. Analyses keep a sequential
//! integer id so clients can poll `/api/analysis/:id` with short ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use super::id::Id;

/// Marker type for Batch records.
pub struct Batch;

/// Marker type for Comparison records.
pub struct Comparison;

/// Typed ID for Batch records.
pub type BatchId = Id<Batch>;

/// Typed ID for Comparison records.
pub type ComparisonId = Id<Comparison>;

/// Sequential id for Analysis records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct AnalysisId(pub i64);

impl AnalysisId {
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AnalysisId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(AnalysisId)
    }
}

impl From<i64> for AnalysisId {
    fn from(value: i64) -> Self {
        AnalysisId(value)
    }
}
