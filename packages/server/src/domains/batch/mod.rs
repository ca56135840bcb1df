//! Batch domain - up to fifty URLs analysed with bounded concurrency

pub mod activities;
pub mod export;
pub mod models;

pub use activities::{process_batch, start_batch, BATCH_CONCURRENCY};
pub use models::{Batch, BatchProgress, BatchStatus};
