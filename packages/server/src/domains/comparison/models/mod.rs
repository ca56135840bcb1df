pub mod comparison;

pub use comparison::{Comparison, ComparisonStatus, NewComparison};
