//! Report statistics model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ReportValidationError;

/// Fields a caller-supplied report must carry.
pub const REQUIRED_REPORT_FIELDS: [&str; 4] = ["tests", "passes", "failures", "duration"];

/// Summary statistics for one test run.
///
/// Counts that are missing or `null` on the wire read as 0, so `{}` is a
/// valid (empty) report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub suites: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub tests: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub passes: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub failures: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub pending: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub skipped: u64,
    /// Test run start time
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    /// Test run end time
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    /// Total duration in milliseconds, as reported by the runner
    #[serde(default, deserialize_with = "null_as_zero")]
    pub duration: u64,
    /// Pass rate as supplied by the runner (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_percent: Option<f64>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub tests_registered: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_percent: Option<f64>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub other: u64,
    #[serde(default)]
    pub has_other: bool,
    #[serde(default)]
    pub has_skipped: bool,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

impl ReportStats {
    /// Read a caller-supplied report.
    ///
    /// Unlike reports from the source, which tolerate missing counts, every
    /// field in [`REQUIRED_REPORT_FIELDS`] must be present.
    pub fn from_custom(data: Value) -> Result<Self, ReportValidationError> {
        let Value::Object(ref fields) = data else {
            return Err(ReportValidationError::NotAnObject);
        };

        let missing: Vec<String> = REQUIRED_REPORT_FIELDS
            .iter()
            .filter(|field| !fields.contains_key(**field))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ReportValidationError::MissingFields(missing));
        }

        serde_json::from_value(data).map_err(|e| ReportValidationError::Invalid(e.to_string()))
    }

    /// Pass rate in percent.
    ///
    /// The runner-supplied `passPercent` wins when present (clamped to 0-100);
    /// otherwise the rate is derived from `passes / tests`.
    pub fn pass_rate(&self) -> f64 {
        match self.pass_percent {
            Some(percent) if percent.is_finite() => percent.clamp(0.0, 100.0),
            _ => percent_of(self.passes, self.tests),
        }
    }

    /// Outcome of this run.
    pub fn status(&self) -> RunStatus {
        RunStatus::from_counts(self.failures, self.passes)
    }

    /// False when both timestamps are present and `end` precedes `start`.
    pub fn has_consistent_timing(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end >= start,
            _ => true,
        }
    }
}

/// `part / whole * 100`, or 0 for an empty whole.
pub fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

/// Outcome of a run or of a set of runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Failed,
    Passed,
    NoTests,
}

impl RunStatus {
    /// Any failure wins, then any pass; otherwise nothing ran.
    pub fn from_counts(failures: u64, passes: u64) -> Self {
        if failures > 0 {
            Self::Failed
        } else if passes > 0 {
            Self::Passed
        } else {
            Self::NoTests
        }
    }

    /// Accent colour used by the renderer.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Failed => "#ef4444",
            Self::Passed => "#10b981",
            Self::NoTests => "#6b7280",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Failed => "Tests Failed",
            Self::Passed => "All Tests Passed",
            Self::NoTests => "No Tests Run",
        }
    }
}
