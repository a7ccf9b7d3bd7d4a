//! E2E tests: multi-project fetch, aggregation and delivery.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::mock_report_source::{MockReportSource, MockResponse, MockSourceState, report_document};
use super::test_helpers::*;

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 31).unwrap()
}

async fn start_mock(projects: Vec<(String, MockResponse)>) -> MockReportSource {
    MockReportSource::start(MockSourceState {
        projects: projects.into_iter().collect::<HashMap<_, _>>(),
        ..Default::default()
    })
    .await
}

/// Every fetch succeeds → projects keep request order and length.
#[actix_rt::test]
async fn test_all_projects_delivered_in_request_order() {
    // Earlier projects answer later, so completion order is reversed
    let mut projects = vec![found("gamma", 3, 3, 0), found("alpha", 5, 5, 0), found("beta", 2, 1, 1)];
    projects[0].1 = MockResponse::Delayed(Duration::from_millis(300), Box::new(projects[0].1.clone()));
    projects[1].1 = MockResponse::Delayed(Duration::from_millis(150), Box::new(projects[1].1.clone()));
    let mock = start_mock(projects).await;

    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let requested = ids(&["gamma", "alpha", "beta"]);
    let outcome = pipeline
        .send_multi_project_report(&requested, start_date())
        .await;

    assert!(outcome.success, "error: {:?}", outcome.error);
    let result = outcome.payload.unwrap();
    let order: Vec<&str> = result.projects().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(order, vec!["gamma", "alpha", "beta"]);
    assert_eq!(result.summary().total_projects, 3);
    assert_eq!(deliverer.sent_count(), 1);
}

/// Scenario A: two reports sum to 13 tests, 12 passes, 1 failure.
#[actix_rt::test]
async fn test_summary_totals() {
    let mock = start_mock(vec![found("p1", 5, 5, 0), found("p2", 8, 7, 1)]).await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let outcome = pipeline
        .send_multi_project_report(&ids(&["p1", "p2"]), start_date())
        .await;

    assert!(outcome.success);
    let summary = outcome.payload.unwrap().summary().clone();
    assert_eq!(summary.total_projects, 2);
    assert_eq!(summary.total_tests, 13);
    assert_eq!(summary.total_passes, 12);
    assert_eq!(summary.total_failures, 1);

    let (envelope, document) = deliverer.last();
    assert!(envelope
        .subject
        .starts_with("Multi-Project Test Report - 2 Projects - "));
    assert_eq!(envelope.to, vec!["team@example.com".to_string()]);
    assert!(document.html.contains("Some Projects Have Failures"));
    assert!(document.text.contains("Totals: 13 tests, 12 passed, 1 failed"));
}

/// Scenario B: one of two fetches fails → one project, still a success.
#[actix_rt::test]
async fn test_partial_failure_still_delivers() {
    let mock = start_mock(vec![
        found("ok", 5, 5, 0),
        ("broken".to_string(), MockResponse::Status(500)),
    ])
    .await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let outcome = pipeline
        .send_multi_project_report(&ids(&["broken", "ok"]), start_date())
        .await;

    assert!(outcome.success);
    let result = outcome.payload.unwrap();
    assert_eq!(result.projects().len(), 1);
    assert_eq!(result.projects()[0].id, "ok");
    assert_eq!(deliverer.sent_count(), 1);
}

/// Empty listings, malformed bodies and unknown projects are all excluded.
#[actix_rt::test]
async fn test_excludes_exactly_the_failed_projects() {
    let mock = start_mock(vec![
        found("a", 1, 1, 0),
        ("empty".to_string(), MockResponse::Documents(vec![])),
        ("garbled".to_string(), MockResponse::Malformed),
        found("b", 2, 2, 0),
    ])
    .await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let outcome = pipeline
        .send_multi_project_report(&ids(&["a", "empty", "garbled", "unknown", "b"]), start_date())
        .await;

    assert!(outcome.success);
    let order: Vec<String> = outcome
        .payload
        .unwrap()
        .projects()
        .iter()
        .map(|p| p.id.clone())
        .collect();
    assert_eq!(order, ids(&["a", "b"]));
}

/// Scenario C: every fetch fails → failure, nothing rendered or delivered.
#[actix_rt::test]
async fn test_all_failed_reports_no_reports_available() {
    let mock = start_mock(vec![
        ("down".to_string(), MockResponse::Status(503)),
        ("empty".to_string(), MockResponse::Documents(vec![])),
    ])
    .await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let outcome = pipeline
        .send_multi_project_report(&ids(&["down", "empty"]), start_date())
        .await;

    assert!(!outcome.success);
    assert!(outcome.payload.is_none());
    assert!(outcome.error.unwrap().contains("no reports available"));
    assert_eq!(deliverer.sent_count(), 0);
}

/// The newest document wins and the start date is forwarded.
#[actix_rt::test]
async fn test_latest_document_selected_with_start_date() {
    let mock = start_mock(vec![(
        "proj".to_string(),
        MockResponse::Documents(vec![
            report_document("newest", "proj", stats(9, 9, 0)),
            report_document("older", "proj", stats(4, 2, 2)),
        ]),
    )])
    .await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let outcome = pipeline
        .send_multi_project_report(&ids(&["proj"]), start_date())
        .await;

    assert!(outcome.success);
    let result = outcome.payload.unwrap();
    assert_eq!(result.projects()[0].id, "newest");
    assert_eq!(result.summary().total_tests, 9);

    let requests = mock.requested_projects();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        ("proj".to_string(), Some("2025-08-31".to_string()))
    );
}

/// A bad older document in the listing does not hide the newest report.
#[actix_rt::test]
async fn test_bad_older_document_ignored() {
    let mock = start_mock(vec![(
        "proj".to_string(),
        MockResponse::Documents(vec![
            report_document("newest", "proj", stats(6, 5, 1)),
            serde_json::json!({"_id": 7, "title": "legacy upload"}),
        ]),
    )])
    .await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let outcome = pipeline
        .send_multi_project_report(&ids(&["proj"]), start_date())
        .await;

    assert!(outcome.success, "error: {:?}", outcome.error);
    let result = outcome.payload.unwrap();
    assert_eq!(result.projects()[0].id, "newest");
    assert_eq!(result.summary().total_failures, 1);
}

/// A hung project is cut off by the fetch timeout; the rest still deliver.
#[actix_rt::test]
async fn test_hung_fetch_times_out() {
    let mut projects = vec![found("hung", 1, 1, 0), found("fast", 2, 2, 0)];
    projects[0].1 = MockResponse::Delayed(Duration::from_secs(5), Box::new(projects[0].1.clone()));
    let mock = start_mock(projects).await;

    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_millis(500));

    let outcome = pipeline
        .send_multi_project_report(&ids(&["hung", "fast"]), start_date())
        .await;

    assert!(outcome.success);
    let result = outcome.payload.unwrap();
    assert_eq!(result.projects().len(), 1);
    assert_eq!(result.projects()[0].id, "fast");
}

/// Delivery rejection fails the invocation even though aggregation worked.
#[actix_rt::test]
async fn test_delivery_failure_reported() {
    let mock = start_mock(vec![found("p1", 5, 5, 0)]).await;
    let deliverer = Arc::new(RecordingDeliverer {
        reject_with: Some("connection refused".to_string()),
        ..Default::default()
    });
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    let outcome = pipeline
        .send_multi_project_report(&ids(&["p1"]), start_date())
        .await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.error.as_deref(),
        Some("SMTP transport error: connection refused")
    );
}

/// Each invocation is a fresh fetch/render/deliver cycle.
#[actix_rt::test]
async fn test_reinvocation_sends_again() {
    let mock = start_mock(vec![found("p1", 5, 5, 0)]).await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer.clone(), Duration::from_secs(10));

    for _ in 0..2 {
        let outcome = pipeline
            .send_multi_project_report(&ids(&["p1"]), start_date())
            .await;
        assert!(outcome.success);
    }

    assert_eq!(deliverer.sent_count(), 2);
    assert_eq!(mock.requested_projects().len(), 2);
}

/// Outcome JSON keeps the `{success, projects, summary}` shape.
#[actix_rt::test]
async fn test_outcome_json_shape() {
    let mock = start_mock(vec![found("p1", 5, 5, 0)]).await;
    let deliverer = Arc::new(RecordingDeliverer::default());
    let pipeline = create_pipeline(&mock, deliverer, Duration::from_secs(10));

    let outcome = pipeline
        .send_multi_project_report(&ids(&["p1"]), start_date())
        .await;
    let value = serde_json::to_value(&outcome).unwrap();

    assert_eq!(value["success"], true);
    assert_eq!(value["summary"]["totalProjects"], 1);
    assert_eq!(value["summary"]["totalTests"], 5);
    assert_eq!(value["projects"][0]["_id"], "p1");
    assert_eq!(value["projects"][0]["report"]["passes"], 5);
    assert!(value.get("error").is_none());
}
