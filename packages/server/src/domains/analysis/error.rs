use thiserror::Error;

use crate::kernel::{FetchError, JudgeError};

/// Failure of a single analysis. Never fatal to sibling analyses.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("External service error: {0}")]
    ExternalService(#[from] JudgeError),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
