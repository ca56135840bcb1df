//! Batch activities - fan many URLs out over the analysis pipeline

mod process_batch;
mod start_batch;

pub use process_batch::{process_batch, spawn_batch, BATCH_CONCURRENCY};
pub use start_batch::{start_batch, MAX_BATCH_URLS};
