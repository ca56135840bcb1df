//! Analysis domain - one URL through fetch, chunk, judge and persist
//!
//! Architecture:
//!   HTTP route → activities::start_analysis → spawned run_analysis → RecordStore

pub mod activities;
pub mod chunker;
pub mod error;
pub mod export;
pub mod models;

pub use activities::{run_analysis, start_analysis};
pub use error::PipelineError;
pub use models::{Analysis, AnalysisStatus};
