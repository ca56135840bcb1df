//! Comparison engine - shared queries, gaps and advantages across analyses.
//!
//! Pure function of its input. `analyses[0]` is the baseline, the rest are
//! competitors. Queries are matched by exact string equality.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::{Coverage, QueryResult};
use crate::domains::analysis::models::Analysis;

pub const TOP_QUERY_LIMIT: usize = 15;
pub const GAP_LIMIT: usize = 10;
pub const UNIQUE_QUERY_LIMIT: usize = 5;
pub const BETTER_COVERAGE_LIMIT: usize = 3;
pub const BASELINE_ADVANTAGE_LIMIT: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComparisonError {
    #[error("At least two analyses are required for comparison, got {count}")]
    InsufficientAnalyses { count: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub baseline_url: String,
    pub baseline_title: Option<String>,
    pub top_queries: Vec<TopQuery>,
    pub coverage_gaps: Vec<CoverageGap>,
    pub competitor_advantages: Vec<CompetitorAdvantage>,
    pub baseline_advantages: Vec<BaselineAdvantage>,
    pub summary: String,
}

/// A query shared by several analyses, with every analysis's coverage of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopQuery {
    pub query: String,
    pub coverage: Vec<UrlCoverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlCoverage {
    pub url: String,
    pub has_content: bool,
    pub coverage_level: Coverage,
    pub is_baseline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageGap {
    pub query: String,
    pub missing_from: Vec<String>,
    pub baseline_has: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorAdvantage {
    pub url: String,
    pub unique_queries: Vec<String>,
    pub better_coverage: Vec<String>,
}

impl CompetitorAdvantage {
    fn strength(&self) -> usize {
        self.unique_queries.len() + self.better_coverage.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineAdvantage {
    pub query: String,
    pub description: String,
}

/// Compare a baseline analysis against its competitors.
pub fn compare(analyses: &[Analysis]) -> Result<ComparisonResult, ComparisonError> {
    let (baseline, competitors) = match analyses {
        [baseline, competitors @ ..] if !competitors.is_empty() => (baseline, competitors),
        _ => {
            return Err(ComparisonError::InsufficientAnalyses {
                count: analyses.len(),
            })
        }
    };

    // query -> urls containing it, in first-seen order
    let mut query_urls: IndexMap<&str, HashSet<&str>> = IndexMap::new();
    // url -> its queries; a repeated url keeps the later list
    let mut url_queries: HashMap<&str, &[QueryResult]> = HashMap::new();

    for analysis in analyses {
        let queries = analysis.query_results();
        if queries.is_empty() {
            continue;
        }
        url_queries.insert(analysis.url.as_str(), queries);
        for q in queries {
            query_urls
                .entry(q.query.as_str())
                .or_default()
                .insert(analysis.url.as_str());
        }
    }

    let baseline_url = baseline.url.as_str();
    let queries_of = |url: &str| url_queries.get(url).copied().unwrap_or_default();
    let baseline_queries = queries_of(baseline_url);

    let mut shared: Vec<(&str, &HashSet<&str>)> = query_urls
        .iter()
        .filter(|(_, urls)| urls.len() > 1)
        .map(|(q, urls)| (*q, urls))
        .collect();
    shared.sort_by(|(_, a), (_, b)| {
        b.contains(baseline_url)
            .cmp(&a.contains(baseline_url))
            .then(b.len().cmp(&a.len()))
    });

    let top_queries = shared
        .into_iter()
        .take(TOP_QUERY_LIMIT)
        .map(|(query, _)| TopQuery {
            query: query.to_string(),
            coverage: analyses
                .iter()
                .map(|analysis| {
                    let found = queries_of(analysis.url.as_str()).iter().find(|q| q.query == query);
                    UrlCoverage {
                        url: analysis.url.clone(),
                        has_content: found.is_some(),
                        coverage_level: found.map(|q| q.coverage).unwrap_or_default(),
                        is_baseline: analysis.url == baseline.url,
                    }
                })
                .collect(),
        })
        .collect();

    let coverage_gaps = query_urls
        .iter()
        .map(|(query, urls)| CoverageGap {
            query: query.to_string(),
            missing_from: analyses
                .iter()
                .filter(|a| !urls.contains(a.url.as_str()))
                .map(|a| a.url.clone())
                .collect(),
            baseline_has: urls.contains(baseline_url),
        })
        .filter(|gap| !gap.missing_from.is_empty() && gap.missing_from.len() < analyses.len())
        .take(GAP_LIMIT)
        .collect();

    let baseline_set: HashSet<&str> = baseline_queries.iter().map(|q| q.query.as_str()).collect();

    let competitor_advantages = competitors
        .iter()
        .map(|competitor| {
            let theirs = queries_of(competitor.url.as_str());

            let unique_queries = theirs
                .iter()
                .filter(|q| !baseline_set.contains(q.query.as_str()))
                .map(|q| q.query.clone())
                .take(UNIQUE_QUERY_LIMIT)
                .collect();

            let better_coverage = theirs
                .iter()
                .filter(|q| {
                    baseline_queries
                        .iter()
                        .find(|b| b.query == q.query)
                        .is_some_and(|b| q.coverage.outranks(b.coverage))
                })
                .map(|q| q.query.clone())
                .take(BETTER_COVERAGE_LIMIT)
                .collect();

            CompetitorAdvantage {
                url: competitor.url.clone(),
                unique_queries,
                better_coverage,
            }
        })
        .filter(|adv| !adv.unique_queries.is_empty() || !adv.better_coverage.is_empty())
        .collect::<Vec<_>>();

    let baseline_advantages = baseline_queries
        .iter()
        .filter(|q| {
            query_urls
                .get(q.query.as_str())
                .is_some_and(|urls| urls.len() == 1 && urls.contains(baseline_url))
        })
        .map(|q| BaselineAdvantage {
            query: q.query.clone(),
            description: if q.description.is_empty() {
                format!("Unique coverage: {}", q.query)
            } else {
                q.description.clone()
            },
        })
        .take(BASELINE_ADVANTAGE_LIMIT)
        .collect();

    let mut result = ComparisonResult {
        baseline_url: baseline.url.clone(),
        baseline_title: baseline.title.clone(),
        top_queries,
        coverage_gaps,
        competitor_advantages,
        baseline_advantages,
        summary: String::new(),
    };
    result.summary = summarize(&result, analyses.len());

    Ok(result)
}

/// One-paragraph description of a comparison result.
pub fn summarize(result: &ComparisonResult, analysis_count: usize) -> String {
    let baseline = host_of(&result.baseline_url);

    let mut summary = format!(
        "Comparison of {} against {} competitors reveals {} key query patterns.",
        baseline,
        analysis_count.saturating_sub(1),
        result.top_queries.len()
    );

    if !result.baseline_advantages.is_empty() {
        summary.push_str(&format!(
            " {} has {} unique content advantages.",
            baseline,
            result.baseline_advantages.len()
        ));
    }

    if !result.coverage_gaps.is_empty() {
        summary.push_str(&format!(
            " Found {} potential improvement areas where competitors have different coverage.",
            result.coverage_gaps.len()
        ));
    }

    // First competitor with the most advantages; ties keep the earlier one.
    let strongest = result
        .competitor_advantages
        .iter()
        .fold(None::<&CompetitorAdvantage>, |best, adv| match best {
            Some(b) if b.strength() >= adv.strength() => Some(b),
            _ => Some(adv),
        });

    if let Some(adv) = strongest {
        summary.push_str(&format!(
            " {} shows {} areas where they outperform the baseline.",
            host_of(&adv.url),
            adv.strength()
        ));
    }

    summary
}

fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
