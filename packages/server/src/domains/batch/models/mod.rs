pub mod batch;

pub use batch::{Batch, BatchProgress, BatchStatus, NewBatch};
