pub mod analysis;

pub use analysis::{Analysis, AnalysisResults, AnalysisStatus, NewAnalysis};
