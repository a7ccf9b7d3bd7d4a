//! Notification pipeline orchestration.
//!
//! Sequences fetch, aggregate, render and deliver for one invocation and
//! folds every failure into a [`PipelineOutcome`]. Nothing is retried and
//! nothing is remembered between invocations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{NotifyError, NotifyResult};
use crate::models::{
    AggregateResult, ConditionalReportPayload, CypressRunResults, JestRunResults,
    PipelineOutcome, ReportStats, SingleReportPayload, sample_projects, sample_report_stats,
};
use crate::services::aggregator::aggregate;
use crate::services::fetcher::{fetch_all, fetch_current};
use crate::services::mailer::{Deliverer, Envelope, SmtpDeliverer};
use crate::services::renderer::{HtmlRenderer, RenderedDocument, Renderer};
use crate::services::report_source::{HttpReportSource, ReportSource};

/// Stages of one invocation. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Fetching,
    Aggregated,
    FetchFailed,
    Rendering,
    Rendered,
    RenderFailed,
    Delivering,
    Delivered,
    DeliveryFailed,
    /// Conditional run decided nothing needed sending
    Skipped,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Delivered
                | Self::FetchFailed
                | Self::RenderFailed
                | Self::DeliveryFailed
                | Self::Skipped
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Fetching => "fetching",
            Self::Aggregated => "aggregated",
            Self::FetchFailed => "fetch_failed",
            Self::Rendering => "rendering",
            Self::Rendered => "rendered",
            Self::RenderFailed => "render_failed",
            Self::Delivering => "delivering",
            Self::Delivered => "delivered",
            Self::DeliveryFailed => "delivery_failed",
            Self::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

impl NotifyError {
    /// Terminal state an invocation ends in when it fails with this error.
    pub fn terminal_state(&self) -> PipelineState {
        match self {
            NotifyError::NoProjectsRequested
            | NotifyError::NoReportsAvailable { .. }
            | NotifyError::Fetch(_)
            | NotifyError::Validation(_)
            | NotifyError::Setup(_) => PipelineState::FetchFailed,
            NotifyError::Render(_) => PipelineState::RenderFailed,
            NotifyError::Delivery(_) => PipelineState::DeliveryFailed,
        }
    }
}

/// Stages one invocation has passed through. Every change is logged.
#[derive(Debug)]
struct StageTracker {
    state: PipelineState,
    path: Vec<PipelineState>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            state: PipelineState::Start,
            path: vec![PipelineState::Start],
        }
    }

    fn advance(&mut self, to: PipelineState) {
        debug!("Pipeline {} -> {}", self.state, to);
        self.state = to;
        self.path.push(to);
    }

    fn describe_path(&self) -> String {
        self.path
            .iter()
            .map(|state| state.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Move into the terminal state for `result` and fold it into an outcome.
    fn finish<T>(&mut self, result: NotifyResult<T>) -> PipelineOutcome<T> {
        match result {
            Ok(payload) => {
                if !self.state.is_terminal() {
                    warn!("Pipeline finished in non-terminal state {}", self.state);
                }
                PipelineOutcome::success(payload)
            }
            Err(e) => {
                self.advance(e.terminal_state());
                error!("Pipeline failed ({}): {}", self.describe_path(), e);
                PipelineOutcome::failure(e.to_string())
            }
        }
    }
}

/// Addressing and limits for a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Sender mailbox
    pub from: String,
    pub to: Vec<String>,
    /// Subject prefix for single-report notifications
    pub subject: String,
    /// Bound on each report fetch
    pub fetch_timeout: Duration,
    /// Projects used by the default multi-project run
    pub default_project_ids: Vec<String>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            from: config.mail.from_mailbox(),
            to: config.mail.to.clone(),
            subject: config.mail.subject.clone(),
            fetch_timeout: config.report_source.fetch_timeout,
            default_project_ids: config.project_ids.clone(),
        }
    }
}

/// Fetch → aggregate → render → deliver.
#[derive(Clone)]
pub struct NotificationPipeline {
    settings: PipelineSettings,
    source: Arc<dyn ReportSource>,
    renderer: Arc<dyn Renderer>,
    deliverer: Arc<dyn Deliverer>,
}

impl NotificationPipeline {
    pub fn new(
        settings: PipelineSettings,
        source: Arc<dyn ReportSource>,
        renderer: Arc<dyn Renderer>,
        deliverer: Arc<dyn Deliverer>,
    ) -> Self {
        Self {
            settings,
            source,
            renderer,
            deliverer,
        }
    }

    /// Wire the HTTP report source, HTML renderer and SMTP deliverer.
    pub fn from_config(config: &Config) -> NotifyResult<Self> {
        let source = HttpReportSource::new(&config.report_source)?;
        Ok(Self::new(
            PipelineSettings::from_config(config),
            Arc::new(source),
            Arc::new(HtmlRenderer::new(config.dashboard_url.clone())),
            Arc::new(SmtpDeliverer::new(config.smtp.clone())),
        ))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Fetch the latest report of every project and deliver one aggregate.
    pub async fn send_multi_project_report(
        &self,
        project_ids: &[String],
        start_date: NaiveDate,
    ) -> PipelineOutcome<AggregateResult> {
        info!("Starting multi-project test report email process");
        let mut stages = StageTracker::new();
        let result = self
            .run_multi_project(&mut stages, project_ids, start_date)
            .await;
        stages.finish(result)
    }

    /// Multi-project run over the configured projects, filtered from today.
    pub async fn send_default_multi_project_report(&self) -> PipelineOutcome<AggregateResult> {
        let today = Utc::now().date_naive();
        let project_ids = self.settings.default_project_ids.clone();
        self.send_multi_project_report(&project_ids, today).await
    }

    /// Deliver the built-in sample projects without contacting the source.
    pub async fn send_sample_multi_project_report(&self) -> PipelineOutcome<AggregateResult> {
        info!("Sending multi-project report with sample data");
        let mut stages = StageTracker::new();
        stages.advance(PipelineState::Aggregated);
        let result = self
            .deliver_aggregate(&mut stages, AggregateResult::new(sample_projects()))
            .await;
        stages.finish(result)
    }

    /// Single-report run. Fetches from the source when no report is supplied.
    pub async fn send_report(
        &self,
        report: Option<ReportStats>,
    ) -> PipelineOutcome<SingleReportPayload> {
        info!("Starting test report email process");
        let mut stages = StageTracker::new();
        let result = match self.obtain_report(&mut stages, report).await {
            Ok(report) => self.deliver_report(&mut stages, report).await,
            Err(e) => Err(e),
        };
        stages.finish(result)
    }

    /// Single-report run with the built-in sample report.
    pub async fn send_sample_report(&self) -> PipelineOutcome<SingleReportPayload> {
        self.send_report(Some(sample_report_stats())).await
    }

    /// Single-report run over caller-supplied JSON.
    ///
    /// The data must carry every field in
    /// [`REQUIRED_REPORT_FIELDS`](crate::models::REQUIRED_REPORT_FIELDS).
    pub async fn send_custom_report(&self, data: Value) -> PipelineOutcome<SingleReportPayload> {
        match ReportStats::from_custom(data) {
            Ok(report) => self.send_report(Some(report)).await,
            Err(e) => {
                info!("Rejecting custom report data");
                StageTracker::new().finish(Err(e.into()))
            }
        }
    }

    /// Single-report run over a Cypress run summary.
    pub async fn send_cypress_report(
        &self,
        run: CypressRunResults,
    ) -> PipelineOutcome<SingleReportPayload> {
        self.send_report(Some(run.into())).await
    }

    /// Single-report run over a Jest result object.
    pub async fn send_jest_report(&self, run: JestRunResults) -> PipelineOutcome<SingleReportPayload> {
        self.send_report(Some(run.into())).await
    }

    /// Single-report run that only sends when something failed or the run
    /// is `critical`. Otherwise succeeds with `skipped: true`.
    pub async fn send_conditional_report(
        &self,
        report: Option<ReportStats>,
        critical: bool,
    ) -> PipelineOutcome<ConditionalReportPayload> {
        info!("Starting conditional test report email process");
        let mut stages = StageTracker::new();
        let result = self.run_conditional(&mut stages, report, critical).await;
        stages.finish(result)
    }

    async fn run_multi_project(
        &self,
        stages: &mut StageTracker,
        project_ids: &[String],
        start_date: NaiveDate,
    ) -> NotifyResult<AggregateResult> {
        if project_ids.is_empty() {
            return Err(NotifyError::NoProjectsRequested);
        }

        stages.advance(PipelineState::Fetching);
        let outcomes = fetch_all(
            self.source.as_ref(),
            project_ids,
            start_date,
            self.settings.fetch_timeout,
        )
        .await;
        let result = aggregate(outcomes)?;
        stages.advance(PipelineState::Aggregated);

        self.deliver_aggregate(stages, result).await
    }

    async fn deliver_aggregate(
        &self,
        stages: &mut StageTracker,
        result: AggregateResult,
    ) -> NotifyResult<AggregateResult> {
        stages.advance(PipelineState::Rendering);
        info!("Rendering multi-project email template");
        let document = self.renderer.render_projects(&result, Utc::now())?;
        stages.advance(PipelineState::Rendered);

        let subject = format!(
            "Multi-Project Test Report - {} Projects - {}",
            result.summary().total_projects,
            Utc::now().date_naive()
        );
        self.deliver(stages, subject, &document).await?;

        log_aggregate_summary(&result);
        Ok(result)
    }

    /// Use the supplied report or fetch the current one.
    async fn obtain_report(
        &self,
        stages: &mut StageTracker,
        report: Option<ReportStats>,
    ) -> NotifyResult<ReportStats> {
        let report = match report {
            Some(report) => {
                info!("Using provided report data");
                report
            }
            None => {
                stages.advance(PipelineState::Fetching);
                info!("Fetching report from source");
                fetch_current(self.source.as_ref(), self.settings.fetch_timeout).await?
            }
        };
        stages.advance(PipelineState::Aggregated);
        Ok(report)
    }

    async fn run_conditional(
        &self,
        stages: &mut StageTracker,
        report: Option<ReportStats>,
        critical: bool,
    ) -> NotifyResult<ConditionalReportPayload> {
        let report = self.obtain_report(stages, report).await?;

        if report.failures == 0 && !critical {
            info!("No email sent: all tests passed and the run is not critical");
            stages.advance(PipelineState::Skipped);
            return Ok(ConditionalReportPayload::skipped());
        }

        let payload = self.deliver_report(stages, report).await?;
        Ok(ConditionalReportPayload::sent(payload.report))
    }

    async fn deliver_report(
        &self,
        stages: &mut StageTracker,
        report: ReportStats,
    ) -> NotifyResult<SingleReportPayload> {
        stages.advance(PipelineState::Rendering);
        info!("Rendering email template");
        let document = self.renderer.render_report(&report, Utc::now())?;
        stages.advance(PipelineState::Rendered);

        let subject = format!("{} - {}", self.settings.subject, Utc::now().date_naive());
        self.deliver(stages, subject, &document).await?;

        info!("Report Summary:");
        info!("   - Total Tests: {}", report.tests);
        info!("   - Passed: {}", report.passes);
        info!("   - Failed: {}", report.failures);
        info!("   - Duration: {}ms", report.duration);

        Ok(SingleReportPayload { report })
    }

    async fn deliver(
        &self,
        stages: &mut StageTracker,
        subject: String,
        document: &RenderedDocument,
    ) -> NotifyResult<()> {
        stages.advance(PipelineState::Delivering);
        info!("Sending email '{}'", subject);

        let envelope = Envelope {
            from: self.settings.from.clone(),
            to: self.settings.to.clone(),
            subject,
        };
        self.deliverer.deliver(&envelope, document).await?;

        stages.advance(PipelineState::Delivered);
        info!("Email sent successfully");
        Ok(())
    }
}

fn log_aggregate_summary(result: &AggregateResult) {
    let summary = result.summary();
    info!("Report Summary:");
    info!("   - Projects: {}", summary.total_projects);
    info!("   - Total Tests: {}", summary.total_tests);
    info!("   - Total Passed: {}", summary.total_passes);
    info!("   - Total Failed: {}", summary.total_failures);

    for (index, project) in result.projects().iter().enumerate() {
        info!(
            "   - {}: {} tests, {} passed, {} failed ({:.1}% pass rate)",
            project.display_name(index),
            project.report.tests,
            project.report.passes,
            project.report.failures,
            project.report.pass_rate()
        );
    }
}
