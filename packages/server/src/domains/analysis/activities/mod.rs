//! Analysis activities - the per-URL pipeline and its entry points

mod run_analysis;
mod start_analysis;

pub use run_analysis::{run_analysis, summarize};
pub use start_analysis::{fail_interrupted_analyses, fail_unfinished_analyses, start_analysis};
