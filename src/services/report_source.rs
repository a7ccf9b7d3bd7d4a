//! Report source client.
//!
//! Reads the latest report of a project from the reporting API, and the bare
//! report used by the single-report pipeline.

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ReportSourceConfig;
use crate::error::FetchError;
use crate::models::{CypressRunResults, JestRunResults, ProjectReport, ReportStats};

/// Wire format of the `startDate` filter.
pub const START_DATE_FORMAT: &str = "%Y-%m-%d";

/// Where reports come from.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Latest report of `project_id` created on or after `start_date`.
    ///
    /// `Ok(None)` means the source knows of no report for the project.
    async fn latest_project_report(
        &self,
        project_id: &str,
        start_date: NaiveDate,
    ) -> Result<Option<ProjectReport>, FetchError>;

    /// The report of the single-report pipeline.
    async fn current_report(&self) -> Result<ReportStats, FetchError>;

    /// Where `current_report` reads from, for error messages.
    fn current_report_target(&self) -> String {
        "current report".to_string()
    }
}

/// Per-project listing returned by the reporting API, newest first.
///
/// Entries stay undecoded: only the head is ever read, so a bad older
/// document must not reject the listing.
#[derive(Debug, Deserialize)]
struct ProjectReportsResponse {
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
}

impl ProjectReportsResponse {
    /// Decode the newest document, if any.
    fn into_latest(self, target: &str) -> Result<Option<ProjectReport>, FetchError> {
        let Some(head) = self.data.and_then(|docs| docs.into_iter().next()) else {
            return Ok(None);
        };

        let doc: ReportDocument =
            serde_json::from_value(head).map_err(|e| FetchError::Malformed {
                target: target.to_string(),
                message: e.to_string(),
            })?;
        Ok(Some(doc.into()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    project: String,
    #[serde(default)]
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    content: ReportContent,
}

#[derive(Debug, Deserialize)]
struct ReportContent {
    #[serde(default)]
    stats: ReportStats,
}

impl From<ReportDocument> for ProjectReport {
    fn from(doc: ReportDocument) -> Self {
        ProjectReport {
            id: doc.id,
            title: doc.title,
            project: doc.project,
            created_at: doc.created_at,
            report: doc.content.stats,
        }
    }
}

/// HTTP implementation backed by reqwest.
#[derive(Clone)]
pub struct HttpReportSource {
    project_endpoint: String,
    report_url: String,
    http_client: reqwest::Client,
}

impl HttpReportSource {
    /// Create a client from settings.
    ///
    /// Only the connect timeout is set here. Whole-fetch bounds are applied by
    /// the callers so they hold for any source.
    pub fn new(config: &ReportSourceConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        let project_endpoint = config.project_endpoint();
        info!(
            "Report source initialized (project_endpoint={}, report_url={})",
            project_endpoint, config.report_url
        );

        Ok(Self {
            project_endpoint,
            report_url: config.report_url.clone(),
            http_client,
        })
    }

    /// URL of one project's report listing.
    pub fn project_url(&self, project_id: &str, start_date: NaiveDate) -> String {
        format!(
            "{}/{}?startDate={}",
            self.project_endpoint,
            urlencoding::encode(project_id),
            start_date.format(START_DATE_FORMAT)
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        target: &str,
    ) -> Result<T, FetchError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                target: target.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                target: target.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            target: target.to_string(),
            message: e.to_string(),
        })?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Malformed {
            target: target.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ReportSource for HttpReportSource {
    async fn latest_project_report(
        &self,
        project_id: &str,
        start_date: NaiveDate,
    ) -> Result<Option<ProjectReport>, FetchError> {
        let url = self.project_url(project_id, start_date);
        debug!("GET {}", url);

        let response: ProjectReportsResponse = self.get_json(&url, project_id).await?;
        response.into_latest(project_id)
    }

    async fn current_report(&self) -> Result<ReportStats, FetchError> {
        debug!("GET {}", self.report_url);
        self.get_json(&self.report_url, &self.report_url).await
    }

    fn current_report_target(&self) -> String {
        self.report_url.clone()
    }
}

/// Layout of a report file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Report statistics; the required fields must be present
    #[default]
    Stats,
    /// Cypress run summary
    Cypress,
    /// Jest `--json` output
    Jest,
}

impl ReportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "stats" => Some(Self::Stats),
            "cypress" => Some(Self::Cypress),
            "jest" => Some(Self::Jest),
            _ => None,
        }
    }

    fn decode(&self, content: &[u8]) -> Result<ReportStats, String> {
        match self {
            Self::Stats => {
                let value: serde_json::Value =
                    serde_json::from_slice(content).map_err(|e| e.to_string())?;
                ReportStats::from_custom(value).map_err(|e| e.to_string())
            }
            Self::Cypress => serde_json::from_slice::<CypressRunResults>(content)
                .map(ReportStats::from)
                .map_err(|e| e.to_string()),
            Self::Jest => serde_json::from_slice::<JestRunResults>(content)
                .map(ReportStats::from)
                .map_err(|e| e.to_string()),
        }
    }
}

/// Read a report from a JSON file.
pub async fn load_report_file(path: &Path, format: ReportFormat) -> Result<ReportStats, FetchError> {
    let target = path.display().to_string();
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| FetchError::Transport {
            target: target.clone(),
            message: e.to_string(),
        })?;

    let stats = format
        .decode(&content)
        .map_err(|message| FetchError::Malformed { target, message })?;

    if !stats.has_consistent_timing() {
        warn!("Report file {} ends before it starts", path.display());
    }

    Ok(stats)
}

/// Parse a `YYYY-MM-DD` start date.
pub fn parse_start_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, START_DATE_FORMAT).ok()
}
