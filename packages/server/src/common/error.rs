use thiserror::Error;

use super::ValidationError;

/// Failure to start a background run.
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
