//! Built-in sample data for dry runs.

use chrono::{DateTime, Utc};

use super::{ProjectReport, ReportStats};

/// 2025-08-31T12:21:59.692Z
const SAMPLE_START_MS: i64 = 1_756_642_919_692;
/// 2025-08-31T12:22:08.185Z
const SAMPLE_END_MS: i64 = 1_756_642_928_185;

/// (id, project, created_at ms, suites, tests, passes, failures, duration, pass %)
const SAMPLE_PROJECTS: [(&str, &str, i64, u64, u64, u64, u64, u64, f64); 6] = [
    ("68b05ec609d4cadd37167c7e", "vysaha", 1_756_642_935_312, 1, 5, 5, 0, 8493, 100.0),
    ("68b0225f2359580bbd1c5bea", "skillcencus", 1_756_642_934_195, 2, 8, 7, 1, 12000, 87.5),
    ("68b022552359580bbd1c5be9", "prapti", 1_756_642_933_152, 1, 3, 3, 0, 5000, 100.0),
    ("68b022482359580bbd1c5be8", "jayaho", 1_756_642_931_663, 1, 6, 5, 1, 8000, 83.3),
    ("68b0223b2359580bbd1c5be7", "ccctraining", 1_756_642_930_283, 2, 4, 4, 0, 6000, 100.0),
    ("68b022292359580bbd1c5be6", "cccsnv", 1_756_642_929_404, 1, 7, 6, 1, 9500, 85.7),
];

fn stats(
    suites: u64,
    tests: u64,
    passes: u64,
    failures: u64,
    duration: u64,
    pass_percent: f64,
) -> ReportStats {
    ReportStats {
        suites,
        tests,
        passes,
        failures,
        start: DateTime::<Utc>::from_timestamp_millis(SAMPLE_START_MS),
        end: DateTime::<Utc>::from_timestamp_millis(SAMPLE_END_MS),
        duration,
        pass_percent: Some(pass_percent),
        tests_registered: tests,
        pending_percent: Some(0.0),
        ..Default::default()
    }
}

/// A single fully passing run.
pub fn sample_report_stats() -> ReportStats {
    stats(1, 5, 5, 0, 8493, 100.0)
}

/// Six projects, three of them with one failure each.
pub fn sample_projects() -> Vec<ProjectReport> {
    SAMPLE_PROJECTS
        .iter()
        .map(
            |&(id, project, created_ms, suites, tests, passes, failures, duration, pass_percent)| {
                ProjectReport {
                    id: id.to_string(),
                    title: format!(
                        "Report file: {}-report-[timestamp]_08312025_122208.json",
                        project
                    ),
                    project: project.to_string(),
                    created_at: DateTime::<Utc>::from_timestamp_millis(created_ms),
                    report: stats(suites, tests, passes, failures, duration, pass_percent),
                }
            },
        )
        .collect()
}
