//! Page and judgment builders shared by the integration tests.

use fanout_core::common::{Coverage, QueryResult};
use fanout_core::kernel::Judgment;

/// Two paragraphs long enough to survive chunking; the second reads as a heading.
pub fn article_body(topic: &str) -> String {
    format!(
        "{topic} is covered here in enough detail that the paragraph is kept as a section \
         of the page, well past the minimum paragraph length.\n\n\
         How to get started with {topic}: the second paragraph walks through the first \
         steps in a way that also clears the length filter."
    )
}

pub fn query(text: &str, coverage: Coverage) -> QueryResult {
    QueryResult::new(text, format!("About {}", text), coverage)
}

pub fn judgment(primary_entity: &str, queries: Vec<QueryResult>, coverage_score: f64) -> Judgment {
    Judgment {
        primary_entity: primary_entity.to_string(),
        queries,
        recommendations: vec![format!("Expand the {} overview", primary_entity)],
        coverage_score,
    }
}

pub fn urls(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|u| u.to_string()).collect()
}
