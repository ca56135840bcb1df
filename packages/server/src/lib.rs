// Query Fan-Out Analyzer - API Core
//
// Predicts how an AI search engine breaks a page into sub-queries, scores the
// page's coverage of each, and compares a page against its competitors.
//
// Pipelines run as spawned tasks; clients poll the HTTP API for progress.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
