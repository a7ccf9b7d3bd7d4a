//! Cross-project aggregate of fetched reports.

use serde::Serialize;

use super::report_stats::percent_of;
use super::{ProjectReport, RunStatus};

/// Totals across all aggregated projects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub total_projects: usize,
    pub total_tests: u64,
    pub total_passes: u64,
    pub total_failures: u64,
    pub total_pending: u64,
    pub total_skipped: u64,
    pub total_duration_ms: u64,
    /// `total_passes / total_tests` in percent
    pub pass_rate: f64,
}

impl AggregateSummary {
    /// Single pass over the projects. Never fails; absent counts are already 0.
    pub fn from_projects(projects: &[ProjectReport]) -> Self {
        let mut summary = projects.iter().fold(
            AggregateSummary::default(),
            |mut acc, project| {
                let stats = &project.report;
                acc.total_projects += 1;
                acc.total_tests = acc.total_tests.saturating_add(stats.tests);
                acc.total_passes = acc.total_passes.saturating_add(stats.passes);
                acc.total_failures = acc.total_failures.saturating_add(stats.failures);
                acc.total_pending = acc.total_pending.saturating_add(stats.pending);
                acc.total_skipped = acc.total_skipped.saturating_add(stats.skipped);
                acc.total_duration_ms = acc.total_duration_ms.saturating_add(stats.duration);
                acc
            },
        );
        summary.pass_rate = percent_of(summary.total_passes, summary.total_tests);
        summary
    }

    /// Any failure anywhere wins; otherwise passed if anything ran at all.
    pub fn status(&self) -> RunStatus {
        if self.total_failures > 0 {
            RunStatus::Failed
        } else if self.total_tests > 0 {
            RunStatus::Passed
        } else {
            RunStatus::NoTests
        }
    }
}

/// Successfully fetched project reports plus their totals.
///
/// Immutable once built: project order is the order the reports were
/// requested in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    projects: Vec<ProjectReport>,
    summary: AggregateSummary,
}

impl AggregateResult {
    pub fn new(projects: Vec<ProjectReport>) -> Self {
        let summary = AggregateSummary::from_projects(&projects);
        Self { projects, summary }
    }

    pub fn projects(&self) -> &[ProjectReport] {
        &self.projects
    }

    pub fn summary(&self) -> &AggregateSummary {
        &self.summary
    }
}
