//! Shared test helpers for pipeline E2E tests.

use async_trait::async_trait;
use report_notifier_lib::config::ReportSourceConfig;
use report_notifier_lib::error::DeliveryError;
use report_notifier_lib::services::{
    Deliverer, DeliveryReceipt, Envelope, HtmlRenderer, HttpReportSource, NotificationPipeline,
    PipelineSettings, RenderedDocument,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::mock_report_source::{MockReportSource, MockResponse, report_document};

/// Deliverer that keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingDeliverer {
    pub sent: Mutex<Vec<(Envelope, RenderedDocument)>>,
    /// Fail every delivery with this transport error
    pub reject_with: Option<String>,
}

impl RecordingDeliverer {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> (Envelope, RenderedDocument) {
        self.sent
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("nothing was delivered")
    }
}

#[async_trait]
impl Deliverer for RecordingDeliverer {
    async fn deliver(
        &self,
        envelope: &Envelope,
        document: &RenderedDocument,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        if let Some(ref message) = self.reject_with {
            return Err(DeliveryError::Transport(message.clone()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((envelope.clone(), document.clone()));
        Ok(DeliveryReceipt {
            code: "250".to_string(),
            message: "2.0.0 Ok: queued".to_string(),
        })
    }
}

/// Stats in the reporting API's format.
pub fn stats(tests: u64, passes: u64, failures: u64) -> Value {
    json!({
        "suites": 1,
        "tests": tests,
        "passes": passes,
        "pending": 0,
        "failures": failures,
        "start": "2025-08-31T12:21:59.692Z",
        "end": "2025-08-31T12:22:08.185Z",
        "duration": 8493,
        "testsRegistered": tests,
        "skipped": 0
    })
}

/// A project that answers with one report.
pub fn found(project_id: &str, tests: u64, passes: u64, failures: u64) -> (String, MockResponse) {
    (
        project_id.to_string(),
        MockResponse::Documents(vec![report_document(
            project_id,
            &format!("project-{}", project_id),
            stats(tests, passes, failures),
        )]),
    )
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Pipeline wired to the mock source and a recording deliverer.
pub fn create_pipeline(
    mock: &MockReportSource,
    deliverer: Arc<RecordingDeliverer>,
    fetch_timeout: Duration,
) -> NotificationPipeline {
    let source = HttpReportSource::new(&ReportSourceConfig {
        api_base_url: mock.base_url.clone(),
        report_url: format!("{}/latest", mock.base_url),
        fetch_timeout,
        connect_timeout: Duration::from_secs(2),
    })
    .expect("failed to build report source");

    let settings = PipelineSettings {
        from: "\"Smoke Testing Reports\" <qa@example.com>".to_string(),
        to: vec!["team@example.com".to_string()],
        subject: "Smoke Testing Report Websites".to_string(),
        fetch_timeout,
        default_project_ids: vec![],
    };

    NotificationPipeline::new(
        settings,
        Arc::new(source),
        Arc::new(HtmlRenderer::new(Some(
            "https://dashboard.example.com".to_string(),
        ))),
        deliverer,
    )
}
