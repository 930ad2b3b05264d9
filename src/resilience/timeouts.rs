//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap collaborator calls with a deadline
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the future cancels the call
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

use crate::backends::CollaboratorError;
use crate::observability::metrics;

/// Run a collaborator call under `deadline`.
///
/// `operation` names the call in logs, metrics and the timeout error.
pub async fn with_deadline<T, F>(
    deadline: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    let result = match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorError::Timeout {
            operation,
            after_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        }),
    };

    if let Err(e) = &result {
        tracing::warn!(operation, error = %e, "Collaborator call failed");
        metrics::record_collaborator_failure(operation);
    }
    result
}
