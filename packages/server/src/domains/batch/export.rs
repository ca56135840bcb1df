use crate::common::csv;
use crate::domains::analysis::models::Analysis;

pub const BATCH_CSV_HEADER: &str =
    "URL,Title,Primary Entity,Coverage Score,Query Coverage,Status\n";

/// One row per analysis in the batch; missing results export as empty fields.
pub fn batch_csv(analyses: &[Analysis]) -> String {
    let mut out = String::from(BATCH_CSV_HEADER);
    for analysis in analyses {
        let score = analysis
            .coverage_score
            .map(|s| s.to_string())
            .unwrap_or_default();

        out.push_str(&csv::record(&[
            analysis.url.as_str(),
            analysis.title.as_deref().unwrap_or_default(),
            analysis.primary_entity.as_deref().unwrap_or_default(),
            score.as_str(),
            analysis.query_coverage.as_deref().unwrap_or_default(),
            analysis.status.as_str(),
        ]));
    }
    out
}
