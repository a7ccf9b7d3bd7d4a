//! Domain models for the report notifier.

pub mod aggregate;
pub mod outcome;
pub mod project_report;
pub mod report_stats;
pub mod run_results;
pub mod sample;

// Re-export commonly used types
pub use aggregate::{AggregateResult, AggregateSummary};
pub use outcome::{ConditionalReportPayload, PipelineOutcome, SingleReportPayload};
pub use project_report::ProjectReport;
pub use report_stats::{REQUIRED_REPORT_FIELDS, ReportStats, RunStatus};
pub use run_results::{CypressRunResults, JestFileResult, JestRunResults};
pub use sample::{sample_projects, sample_report_stats};
