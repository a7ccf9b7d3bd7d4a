//! Concurrent per-project report fetching.
//!
//! Every identifier is fetched at once and the batch is joined with a
//! wait-for-all barrier, so one slow or failing project never cancels its
//! siblings. Outcomes come back in request order regardless of which fetch
//! finished first.

use std::time::Duration;

use chrono::NaiveDate;
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::models::{ProjectReport, ReportStats};
use crate::services::report_source::ReportSource;

/// Result of fetching one project.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub project_id: String,
    /// `Ok(None)` when the source has no report for the project
    pub result: Result<Option<ProjectReport>, FetchError>,
}

/// Fetch the latest report for every identifier, one slot per identifier.
pub async fn fetch_all(
    source: &dyn ReportSource,
    project_ids: &[String],
    start_date: NaiveDate,
    timeout: Duration,
) -> Vec<FetchOutcome> {
    info!(
        "Fetching reports for {} projects (startDate={})",
        project_ids.len(),
        start_date
    );

    let fetches = project_ids
        .iter()
        .map(|project_id| fetch_one(source, project_id, start_date, timeout));

    join_all(fetches).await
}

/// Fetch one project, bounded by `timeout`.
pub async fn fetch_one(
    source: &dyn ReportSource,
    project_id: &str,
    start_date: NaiveDate,
    timeout: Duration,
) -> FetchOutcome {
    let result = if project_id.trim().is_empty() {
        Err(FetchError::InvalidProjectId)
    } else {
        info!("Fetching report for project {}", project_id);
        match tokio::time::timeout(timeout, source.latest_project_report(project_id, start_date))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                target: project_id.to_string(),
                after: timeout,
            }),
        }
    };

    if let Ok(Some(ref report)) = result {
        info!("Found report for project {}: {}", project_id, report.title);
        if !report.report.has_consistent_timing() {
            warn!(
                "Report {} for project {} ends before it starts",
                report.id, project_id
            );
        }
    }

    FetchOutcome {
        project_id: project_id.to_string(),
        result,
    }
}

/// Fetch the single-pipeline report, bounded by `timeout`.
pub async fn fetch_current(
    source: &dyn ReportSource,
    timeout: Duration,
) -> Result<ReportStats, FetchError> {
    match tokio::time::timeout(timeout, source.current_report()).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            target: source.current_report_target(),
            after: timeout,
        }),
    }
}
