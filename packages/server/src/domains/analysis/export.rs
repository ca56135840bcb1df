//! Analysis export as a JSON document or a CSV of its queries.

use anyhow::Result;

use crate::common::csv;
use crate::domains::analysis::models::Analysis;

pub const QUERIES_CSV_HEADER: &str = "Query,Description,Coverage\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Parse the `format` query parameter; anything but "csv" is JSON.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// A rendered export ready to send as an attachment.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

pub fn export_analysis(analysis: &Analysis, format: ExportFormat) -> Result<ExportFile> {
    let body = match format {
        ExportFormat::Json => serde_json::to_string_pretty(analysis)?,
        ExportFormat::Csv => queries_csv(analysis),
    };

    Ok(ExportFile {
        filename: format!("analysis-{}.{}", analysis.id, format.extension()),
        content_type: format.content_type(),
        body,
    })
}

/// One row per judged query. Analyses without results export just the header.
pub fn queries_csv(analysis: &Analysis) -> String {
    let mut out = String::from(QUERIES_CSV_HEADER);
    for query in analysis.query_results() {
        out.push_str(&csv::record(&[
            query.query.as_str(),
            query.description.as_str(),
            query.coverage.as_str(),
        ]));
    }
    out
}
