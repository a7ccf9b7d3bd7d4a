//! E2E tests: single-report pipeline.

use report_notifier_lib::models::ReportStats;
use std::sync::Arc;
use std::time::Duration;

use super::mock_report_source::{MockReportSource, MockResponse, MockSourceState};
use super::test_helpers::*;

/// No data supplied → the report is fetched from the report URL.
#[actix_rt::test]
async fn test_fetches_report_when_not_supplied() {
    let mock = MockReportSource::start(MockSourceState {
        latest: Some(MockResponse::Json(stats(20, 17, 3))),
        ..Default::default()
    })
    .await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let outcome = pipeline.send_report(None).await;

    assert!(outcome.success, "error: {:?}", outcome.error);
    let report = outcome.payload.unwrap().report;
    assert_eq!(report.tests, 20);
    assert_eq!(report.failures, 3);

    let (envelope, document) = deliverer.last();
    assert!(envelope
        .subject
        .starts_with("Smoke Testing Report Websites - "));
    assert!(document.html.contains("Tests Failed"));
    assert!(document.html.contains("View Dashboard"));
}

/// Supplied data skips the source entirely.
#[actix_rt::test]
async fn test_uses_supplied_report() {
    let mock = MockReportSource::start(MockSourceState::default()).await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let report = ReportStats {
        tests: 8,
        passes: 0,
        failures: 8,
        duration: 5000,
        ..Default::default()
    };
    let outcome = pipeline.send_report(Some(report.clone())).await;

    assert!(outcome.success);
    assert_eq!(outcome.payload.unwrap().report, report);
    assert!(mock.requested_projects().is_empty());
    assert_eq!(deliverer.sent_count(), 1);
}

/// Source failure ends the invocation before rendering.
#[actix_rt::test]
async fn test_source_failure_reported() {
    let mock = MockReportSource::start(MockSourceState {
        latest: Some(MockResponse::Status(503)),
        ..Default::default()
    })
    .await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let outcome = pipeline.send_report(None).await;

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("HTTP 503"));
    assert_eq!(deliverer.sent_count(), 0);
}

/// A source that accepts but never answers is cut off by the fetch timeout.
#[actix_rt::test]
async fn test_hung_source_times_out() {
    let mock = MockReportSource::start(MockSourceState {
        latest: Some(MockResponse::Delayed(
            Duration::from_secs(5),
            Box::new(MockResponse::Json(stats(1, 1, 0))),
        )),
        ..Default::default()
    })
    .await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_millis(500));

    let started = std::time::Instant::now();
    let outcome = pipeline.send_report(None).await;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(!outcome.success);
    let error = outcome.error.unwrap();
    assert!(error.starts_with("Timed out fetching report for"), "{}", error);
    assert!(error.contains("/latest"));
    assert_eq!(deliverer.sent_count(), 0);
}

/// Conditional run over a fetched report: clean runs are skipped.
#[actix_rt::test]
async fn test_conditional_skips_clean_fetched_report() {
    let mock = MockReportSource::start(MockSourceState {
        latest: Some(MockResponse::Json(stats(5, 5, 0))),
        ..Default::default()
    })
    .await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let outcome = pipeline.send_conditional_report(None, false).await;

    assert!(outcome.success);
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value, serde_json::json!({"success": true, "skipped": true}));
    assert_eq!(deliverer.sent_count(), 0);
}

/// The sample report goes out without touching the source.
#[actix_rt::test]
async fn test_sample_report() {
    let mock = MockReportSource::start(MockSourceState::default()).await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let outcome = pipeline.send_sample_report().await;

    assert!(outcome.success);
    assert_eq!(outcome.payload.unwrap().report.tests, 5);
    let (_, document) = deliverer.last();
    assert!(document.html.contains("All Tests Passed"));
}
