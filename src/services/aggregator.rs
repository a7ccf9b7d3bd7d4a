//! Reduction of per-project fetch outcomes into one aggregate.

use tracing::{error, info, warn};

use crate::error::{NotifyError, NotifyResult};
use crate::models::AggregateResult;
use crate::services::fetcher::FetchOutcome;

/// Keep every successful report in request order and drop the rest.
///
/// Partial failure is fine. Only a batch in which nothing succeeded is an
/// error.
pub fn aggregate(outcomes: Vec<FetchOutcome>) -> NotifyResult<AggregateResult> {
    let requested = outcomes.len();
    let mut projects = Vec::with_capacity(requested);

    for outcome in outcomes {
        match outcome.result {
            Ok(Some(report)) => projects.push(report),
            Ok(None) => warn!("No reports found for project {}", outcome.project_id),
            Err(e) => error!(
                "Error fetching report for project {}: {}",
                outcome.project_id, e
            ),
        }
    }

    if projects.is_empty() {
        return Err(NotifyError::NoReportsAvailable { requested });
    }

    info!(
        "Successfully fetched {} of {} project reports",
        projects.len(),
        requested
    );

    Ok(AggregateResult::new(projects))
}
