//! Comparison domain - a baseline page measured against competitors

pub mod activities;
pub mod engine;
pub mod models;

pub use activities::{process_comparison, start_comparison};
pub use engine::{compare, ComparisonError, ComparisonResult};
pub use models::{Comparison, ComparisonStatus};
