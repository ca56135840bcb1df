//! Comparison activities - baseline and competitors analysed in order

mod process_comparison;
mod start_comparison;

pub use process_comparison::{process_comparison, spawn_comparison};
pub use start_comparison::{start_comparison, MAX_COMPARISON_URLS, MIN_COMPARISON_URLS};
