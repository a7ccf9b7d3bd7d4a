//! Result shapes of common test runners, adapted into [`ReportStats`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::report_stats::percent_of;
use super::ReportStats;

/// Summary of a Cypress run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CypressRunResults {
    #[serde(default)]
    pub total_tests: u64,
    #[serde(default)]
    pub passed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub suites: u64,
    /// Milliseconds
    #[serde(default)]
    pub duration: u64,
    #[serde(default, deserialize_with = "run_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "run_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
}

impl From<CypressRunResults> for ReportStats {
    fn from(run: CypressRunResults) -> Self {
        ReportStats {
            suites: run.suites,
            tests: run.total_tests,
            passes: run.passed,
            failures: run.failed,
            pending: run.pending,
            skipped: run.skipped,
            start: run.start_time,
            end: run.end_time,
            duration: run.duration,
            pass_percent: Some(percent_of(run.passed, run.total_tests)),
            tests_registered: run.total_tests,
            has_skipped: run.skipped > 0,
            ..Default::default()
        }
    }
}

/// Aggregated result object produced by Jest (`--json`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JestRunResults {
    #[serde(default)]
    pub num_total_tests: u64,
    #[serde(default)]
    pub num_passed_tests: u64,
    #[serde(default)]
    pub num_failed_tests: u64,
    #[serde(default)]
    pub num_pending_tests: u64,
    #[serde(default)]
    pub num_total_test_suites: u64,
    #[serde(default, deserialize_with = "run_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "run_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub test_results: Vec<JestFileResult>,
}

/// Per-file entry of a Jest run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JestFileResult {
    /// Milliseconds
    #[serde(default)]
    pub duration: u64,
}

impl From<JestRunResults> for ReportStats {
    fn from(run: JestRunResults) -> Self {
        let duration = run
            .test_results
            .iter()
            .fold(0u64, |total, file| total.saturating_add(file.duration));

        ReportStats {
            suites: run.num_total_test_suites,
            tests: run.num_total_tests,
            passes: run.num_passed_tests,
            failures: run.num_failed_tests,
            pending: run.num_pending_tests,
            start: run.start_time,
            end: run.end_time,
            duration,
            pass_percent: Some(percent_of(run.num_passed_tests, run.num_total_tests)),
            tests_registered: run.num_total_tests,
            ..Default::default()
        }
    }
}

/// Runners report times either as RFC 3339 text or as epoch milliseconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

fn run_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTimestamp::Millis(ms)) => DateTime::<Utc>::from_timestamp_millis(ms)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {}", ms))),
        Some(RawTimestamp::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", text, e))),
    }
}
