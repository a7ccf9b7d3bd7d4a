//! Uniform result returned by every pipeline entry point.

use serde::Serialize;

use super::ReportStats;

/// `{"success": true, ...payload}` or `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome<T> {
    pub success: bool,
    #[serde(flatten)]
    pub payload: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> PipelineOutcome<T> {
    pub fn success(payload: T) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Payload of the single-report pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleReportPayload {
    pub report: ReportStats,
}

/// Payload of a conditional single-report run.
///
/// `{"skipped": true}` when nothing was sent, otherwise the sent report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalReportPayload {
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportStats>,
}

impl ConditionalReportPayload {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            report: None,
        }
    }

    pub fn sent(report: ReportStats) -> Self {
        Self {
            skipped: false,
            report: Some(report),
        }
    }
}
