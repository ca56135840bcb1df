// Business domains
pub mod analysis;
pub mod batch;
pub mod comparison;
