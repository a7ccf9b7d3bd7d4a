//! Domain error types for the report notifier.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use std::time::Duration;

/// Failure to obtain a report from the report source.
///
/// `target` is the project id for per-project lookups, or the URL/path the
/// single report was read from.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Project identifier was empty
    #[error("Project identifier must not be empty")]
    InvalidProjectId,

    /// Connection or protocol failure
    #[error("Failed to fetch report for {target}: {message}")]
    Transport { target: String, message: String },

    /// Report source answered with a non-success status
    #[error("Failed to fetch report for {target}: HTTP {status}")]
    Status { target: String, status: u16 },

    /// Response body could not be decoded
    #[error("Malformed report for {target}: {message}")]
    Malformed { target: String, message: String },

    /// Fetch did not complete in time
    #[error("Timed out fetching report for {target} after {after:?}")]
    Timeout { target: String, after: Duration },
}

/// Template rendering failed.
#[derive(Debug, thiserror::Error)]
#[error("Render error: {0}")]
pub struct RenderError(pub String);

impl From<std::fmt::Error> for RenderError {
    fn from(err: std::fmt::Error) -> Self {
        RenderError(format!("failed to write document: {}", err))
    }
}

/// Message transport failures.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Sender or recipient could not be parsed as a mailbox
    #[error("Invalid address '{address}': {message}")]
    Address { address: String, message: String },

    /// Message could not be assembled
    #[error("Failed to build message: {0}")]
    Message(String),

    /// Transport refused the message or could not connect
    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// Caller-supplied report data was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportValidationError {
    #[error("Report data must be a JSON object")]
    NotAnObject,

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Fields were present but could not be read as a report
    #[error("Invalid report data: {0}")]
    Invalid(String),
}

/// Pipeline-level errors. Each one ends an invocation.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Caller passed an empty identifier list
    #[error("No project identifiers were requested")]
    NoProjectsRequested,

    /// Every requested project fetch failed
    #[error("No project reports could be fetched: no reports available for {requested} requested project(s)")]
    NoReportsAvailable { requested: usize },

    /// Single-report fetch failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Caller-supplied report was rejected before sending
    #[error(transparent)]
    Validation(#[from] ReportValidationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Collaborator construction failed
    #[error("Setup error: {0}")]
    Setup(String),
}

/// Convenience type alias for Results with NotifyError.
pub type NotifyResult<T> = Result<T, NotifyError>;

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Setup(format!("HTTP client: {}", err))
    }
}
