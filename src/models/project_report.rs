//! Project report model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReportStats;

/// The latest report of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReport {
    /// Stable project report identifier
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Human label, usually the uploaded report file name
    #[serde(default)]
    pub title: String,
    /// Short project name
    #[serde(default)]
    pub project: String,
    /// When the report was generated
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub report: ReportStats,
}

impl ProjectReport {
    /// Name shown to readers: project, then title, then the 1-based position.
    pub fn display_name(&self, index: usize) -> String {
        if !self.project.is_empty() {
            self.project.clone()
        } else if !self.title.is_empty() {
            self.title.clone()
        } else {
            format!("Project {}", index + 1)
        }
    }
}
