//! Value types shared by the pipeline, the store and the HTTP surface.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How well a page answers a sub-query.
///
/// Ordering is strict: `No < Partial < Yes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum Coverage {
    Yes,
    Partial,
    #[default]
    No,
}

impl Coverage {
    pub fn rank(self) -> u8 {
        match self {
            Coverage::No => 1,
            Coverage::Partial => 2,
            Coverage::Yes => 3,
        }
    }

    /// True when `self` strictly outranks `other`.
    pub fn outranks(self, other: Coverage) -> bool {
        self.rank() > other.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Coverage::Yes => "Yes",
            Coverage::Partial => "Partial",
            Coverage::No => "No",
        }
    }
}

impl std::fmt::Display for Coverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Coverage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "Yes" => Ok(Coverage::Yes),
            "Partial" => Ok(Coverage::Partial),
            "No" => Ok(Coverage::No),
            _ => Err(anyhow::anyhow!("Invalid coverage level: {}", s)),
        }
    }
}

/// One predicted sub-query and how well the page covers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QueryResult {
    /// The sub-query text
    pub query: String,
    /// Brief explanation of what the query seeks
    pub description: String,
    pub coverage: Coverage,
}

impl QueryResult {
    pub fn new(query: impl Into<String>, description: impl Into<String>, coverage: Coverage) -> Self {
        Self {
            query: query.into(),
            description: description.into(),
            coverage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    PrimaryTopic,
    Section,
    Heading,
}

/// Heuristic likelihood that a chunk generates a search sub-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryPotential {
    High,
    Medium,
    Low,
}

impl QueryPotential {
    /// Rating by untruncated paragraph length.
    pub fn from_length(length: usize) -> Self {
        if length > 300 {
            QueryPotential::High
        } else if length > 150 {
            QueryPotential::Medium
        } else {
            QueryPotential::Low
        }
    }
}

/// A classified segment of page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticChunk {
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    /// Leading slice of the segment, bounded in length
    pub content: String,
    /// Length of the segment before truncation
    pub length: usize,
    pub query_potential: QueryPotential,
}

/// Lifecycle of a record that groups several analyses (batches, comparisons).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ContainerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerStatus::Pending => "pending",
            ContainerStatus::Processing => "processing",
            ContainerStatus::Completed => "completed",
            ContainerStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ContainerStatus::Completed | ContainerStatus::Failed)
    }
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContainerStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "pending" => Ok(ContainerStatus::Pending),
            "processing" => Ok(ContainerStatus::Processing),
            "completed" => Ok(ContainerStatus::Completed),
            "failed" => Ok(ContainerStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid status: {}", s)),
        }
    }
}
