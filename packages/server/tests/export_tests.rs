//! CSV exports must survive a standards-compliant parser, awkward text included.

mod common;

use common::{judgment, urls, TestHarness};
use fanout_core::common::{Coverage, QueryResult};
use fanout_core::domains::analysis::export::queries_csv;
use fanout_core::domains::analysis::start_analysis;
use fanout_core::domains::batch::export::batch_csv;
use fanout_core::domains::batch::start_batch;
use fanout_core::kernel::{MockContentSource, MockJudge};
use pretty_assertions::assert_eq;

/// Minimal RFC 4180 reader: quoted fields may hold commas, doubled quotes and newlines.
fn parse_csv(input: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => quoted = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => quoted = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

fn awkward_queries() -> Vec<QueryResult> {
    vec![
        QueryResult::new("price, per \"unit\"", "Cost, with quotes", Coverage::Yes),
        QueryResult::new("multi\nline", "Spans\ntwo lines", Coverage::Partial),
        QueryResult::new("plain", "", Coverage::No),
    ]
}

#[tokio::test]
async fn analysis_queries_csv_round_trips() {
    let url = "https://shop.example.com/item";
    let content_source = MockContentSource::new().with_page(url, "Item, \"deluxe\"", "Body.");
    let judge = MockJudge::new().with_response(judgment("Item", awkward_queries(), 5.0));
    let ctx = TestHarness::with_mocks(content_source, judge);

    let started = start_analysis(url, ctx.deps()).await.unwrap();
    let analysis = ctx.wait_for_analysis(started.id).await;

    let rows = parse_csv(&queries_csv(&analysis));
    assert_eq!(rows[0], vec!["Query", "Description", "Coverage"]);

    let parsed: Vec<(String, String, String)> = rows[1..]
        .iter()
        .map(|r| (r[0].clone(), r[1].clone(), r[2].clone()))
        .collect();
    let expected: Vec<(String, String, String)> = awkward_queries()
        .into_iter()
        .map(|q| (q.query, q.description, q.coverage.to_string()))
        .collect();
    assert_eq!(parsed, expected);
}

#[tokio::test]
async fn batch_csv_round_trips_with_empty_fields_for_failures() {
    let good = "https://good.example.com";
    let bad = "https://bad.example.com";
    let content_source = MockContentSource::new()
        .with_page(good, "Title, with \"quotes\"", "Body.")
        .with_failure(bad);
    let ctx = TestHarness::with_mocks(content_source, MockJudge::new());

    let (batch, _) = start_batch(&urls(&[good, bad]), Some("Mixed"), ctx.deps())
        .await
        .unwrap();
    ctx.wait_for_batch(batch.id).await;
    let analyses = ctx.store().analyses_by_batch(batch.id).await.unwrap();

    let rows = parse_csv(&batch_csv(&analyses));
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[1],
        vec![
            good,
            "Title, with \"quotes\"",
            "Mock Topic",
            "7",
            "1/3",
            "completed"
        ]
    );
    assert_eq!(rows[2], vec![bad, "", "", "", "", "failed"]);
}
