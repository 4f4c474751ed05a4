//! Error taxonomy for the orchestration pipeline
//!
//! Fatal errors abort the run (planning and synthesis); per-task worker
//! failures never reach this module; the dispatcher degrades them into
//! output strings.

use thiserror::Error;

use pharmos_protocol::PlanValidationError;
use pharmos_providers::{ProviderError, ResolveError};

/// Planning-stage failures. All fatal.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Backend(#[from] ResolveError),

    #[error("plan generation request failed: {0}")]
    Generation(#[source] ProviderError),

    #[error("planner output failed schema validation: {reason}")]
    Schema { reason: String, raw: String },

    #[error("plan is structurally invalid: {0}")]
    Invalid(#[from] PlanValidationError),
}

/// Dispatch-stage failures. Only a structurally invalid plan is an error;
/// individual task failures are recorded as outputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("plan selects no agents")]
    EmptyPlan,
}

/// Synthesis-stage failures. All fatal, but they occur after tool data was
/// gathered.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Backend(#[from] ResolveError),

    #[error("report generation request failed: {0}")]
    Generation(#[source] ProviderError),
}

/// Top-level run outcome errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("planning failed: {0}")]
    Plan(#[from] PlanError),

    #[error("execution rejected the plan: {0}")]
    InvalidPlan(#[from] DispatchError),

    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("run cancelled")]
    Cancelled,
}

impl RunError {
    /// True when the failure means no generation backend was reachable, as
    /// opposed to a malformed plan or a cancelled run.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self,
            RunError::Plan(PlanError::Backend(_)) | RunError::Synthesis(SynthesisError::Backend(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmos_providers::ProviderError;

    #[test]
    fn backend_unavailable_is_distinguishable_from_schema_failure() {
        let backend = RunError::Plan(PlanError::Backend(ResolveError::BackendUnavailable {
            last: ProviderError::EmptyResponse,
        }));
        let schema = RunError::Plan(PlanError::Schema {
            reason: "missing molecule".to_string(),
            raw: "{}".to_string(),
        });

        assert!(backend.is_backend_unavailable());
        assert!(!schema.is_backend_unavailable());
    }
}
