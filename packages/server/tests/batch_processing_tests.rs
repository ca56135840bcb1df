//! Integration tests for batch start-up and the bounded-concurrency coordinator.

mod common;

use std::time::Duration;

use common::{urls, TestHarness};
use fanout_core::common::StartError;
use fanout_core::domains::analysis::AnalysisStatus;
use fanout_core::domains::batch::{start_batch, BatchStatus, BATCH_CONCURRENCY};
use fanout_core::kernel::{MockContentSource, MockJudge};
use pretty_assertions::assert_eq;
use test_context::test_context;

fn seven_urls() -> Vec<String> {
    (1..=7).map(|i| format!("https://site{}.example.com/", i)).collect()
}

#[tokio::test]
async fn batch_runs_in_bounded_groups_and_counts_failures() {
    let all = seven_urls();
    let content_source = MockContentSource::new()
        .with_failure(&all[3])
        .with_delay(Duration::from_millis(40));
    let ctx = TestHarness::with_mocks(content_source, MockJudge::new());

    let (batch, analyses) = start_batch(&all, Some("Launch audit"), ctx.deps())
        .await
        .unwrap();
    assert_eq!(batch.status, BatchStatus::Pending);
    assert_eq!(batch.total_urls, 7);
    assert_eq!(batch.name, "Launch audit");
    assert_eq!(analyses.len(), 7);
    assert!(analyses.iter().all(|a| a.batch_id == Some(batch.id)));

    let done = ctx.wait_for_batch(batch.id).await;
    assert_eq!(done.status, BatchStatus::Completed);
    assert_eq!(done.completed_urls, 6);
    assert_eq!(done.failed_urls, 1);
    assert_eq!(done.progress(), 100);

    let max = ctx.mocks.content_source.max_concurrent();
    assert!(max <= BATCH_CONCURRENCY, "{} fetches overlapped", max);
    assert!(max > 1, "batch items never overlapped");

    let stored = ctx.store().analyses_by_batch(batch.id).await.unwrap();
    let stored_urls: Vec<&str> = stored.iter().map(|a| a.url.as_str()).collect();
    let expected: Vec<&str> = all.iter().map(String::as_str).collect();
    assert_eq!(stored_urls, expected);
    assert_eq!(stored[3].status, AnalysisStatus::Failed);
    assert!(stored
        .iter()
        .enumerate()
        .all(|(i, a)| i == 3 || a.status == AnalysisStatus::Completed));
}

#[tokio::test]
async fn batch_completes_even_when_every_item_fails() {
    let all = urls(&["https://down1.example.com", "https://down2.example.com"]);
    let content_source = MockContentSource::new()
        .with_failure(&all[0])
        .with_failure(&all[1]);
    let ctx = TestHarness::with_mocks(content_source, MockJudge::new());

    let (batch, _) = start_batch(&all, None, ctx.deps()).await.unwrap();
    let done = ctx.wait_for_batch(batch.id).await;

    assert_eq!(done.status, BatchStatus::Completed);
    assert_eq!(done.completed_urls, 0);
    assert_eq!(done.failed_urls, 2);
    assert!(ctx.mocks.judge.calls().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn blank_batch_name_gets_dated_default(ctx: &TestHarness) {
    let (batch, _) = start_batch(&urls(&["https://a.example.com"]), Some("   "), ctx.deps())
        .await
        .unwrap();

    assert!(batch.name.starts_with("Batch Analysis "), "{}", batch.name);
    ctx.wait_for_batch(batch.id).await;
}

#[test_context(TestHarness)]
#[tokio::test]
async fn batch_size_and_urls_are_validated_up_front(ctx: &TestHarness) {
    let empty: Vec<String> = Vec::new();
    let too_many: Vec<String> = (0..51).map(|i| format!("https://e{}.example.com", i)).collect();
    let one_bad = urls(&["https://ok.example.com", "nope"]);

    let err = start_batch(&empty, None, ctx.deps()).await.unwrap_err();
    assert_eq!(err.to_string(), "At least one URL is required");

    let err = start_batch(&too_many, None, ctx.deps()).await.unwrap_err();
    assert_eq!(err.to_string(), "Maximum 50 URLs allowed");

    let err = start_batch(&one_bad, None, ctx.deps()).await.unwrap_err();
    assert!(matches!(err, StartError::Validation(_)));
    assert_eq!(err.to_string(), "Invalid URL format: nope");

    assert!(ctx.store().recent_batches(10).await.unwrap().is_empty());
    assert!(ctx.store().recent_analyses(10).await.unwrap().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn recent_batches_are_newest_first(ctx: &TestHarness) {
    for name in ["first", "second", "third"] {
        let (batch, _) = start_batch(&urls(&["https://a.example.com"]), Some(name), ctx.deps())
            .await
            .unwrap();
        ctx.wait_for_batch(batch.id).await;
    }

    let recent = ctx.store().recent_batches(2).await.unwrap();
    let names: Vec<&str> = recent.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["third", "second"]);
}

#[tokio::test]
async fn panicking_item_fails_the_batch_and_its_unfinished_analyses() {
    let all = urls(&["https://boom.example.com", "https://calm.example.com"]);
    let judge = MockJudge::new().with_panic_for("Page: https://boom.example.com");
    let ctx = TestHarness::with_mocks(MockContentSource::new(), judge);

    let (batch, _) = start_batch(&all, Some("Panics"), ctx.deps()).await.unwrap();
    let done = ctx.wait_for_batch(batch.id).await;
    assert_eq!(done.status, BatchStatus::Failed);

    let stored = ctx.store().analyses_by_batch(batch.id).await.unwrap();
    assert_eq!(stored[0].status, AnalysisStatus::Failed);
    assert!(stored.iter().all(|a| a.status.is_terminal()));
}

#[tokio::test]
async fn batch_fails_when_completion_cannot_be_recorded() {
    let all = urls(&["https://a.example.com", "https://b.example.com"]);
    let ctx =
        TestHarness::new().with_failing_store(|s| s.fail_batch_status(BatchStatus::Completed));

    let (batch, _) = start_batch(&all, None, ctx.deps()).await.unwrap();
    let done = ctx.wait_for_batch(batch.id).await;

    assert_eq!(done.status, BatchStatus::Failed);
    assert_eq!(done.completed_urls, 2);
    assert_eq!(done.failed_urls, 0);

    // Items finished before the write failed and keep their results
    let stored = ctx.store().analyses_by_batch(batch.id).await.unwrap();
    assert!(stored.iter().all(|a| a.status == AnalysisStatus::Completed));
}

#[tokio::test]
async fn batch_fails_when_counters_cannot_be_recorded() {
    let all = seven_urls();
    let ctx = TestHarness::new().with_failing_store(|s| s.fail_batch_counts());

    let (batch, _) = start_batch(&all, None, ctx.deps()).await.unwrap();
    let done = ctx.wait_for_batch(batch.id).await;
    assert_eq!(done.status, BatchStatus::Failed);

    // Processing stops after the first group; later items never start
    let stored = ctx.store().analyses_by_batch(batch.id).await.unwrap();
    assert!(stored.iter().all(|a| a.status.is_terminal()));
    assert_eq!(ctx.mocks.content_source.calls().len(), BATCH_CONCURRENCY);
    assert!(stored[BATCH_CONCURRENCY..]
        .iter()
        .all(|a| a.status == AnalysisStatus::Failed));
}
