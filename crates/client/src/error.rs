//! Workflow-level error model.

use thiserror::Error;

use cokins_core::DomainError;

use crate::api::ApiError;

pub const UNREACHABLE_MESSAGE: &str = "Unable to reach the server. Please try again.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Reconciliation failed. Please try again.";

/// Failure of a reconciliation step.
///
/// None of these leave the session half-updated: on error the overlay, the
/// sequencer state and the pending explanation are exactly as before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Bad input or an illegal workflow step; nothing was sent.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("failed to load stock movements: {0}")]
    Fetch(ApiError),

    /// The explanation could not be saved; the bulk write was not attempted.
    #[error("failed to save explanation: {0}")]
    CommentUpdate(ApiError),

    #[error("failed to write reconciled quantities: {0}")]
    BulkWrite(ApiError),
}

impl ReconcileError {
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ReconcileError::Domain(_) => None,
            ReconcileError::Fetch(e)
            | ReconcileError::CommentUpdate(e)
            | ReconcileError::BulkWrite(e) => Some(e),
        }
    }

    /// Text to show the operator: the backend's own message when it sent one,
    /// otherwise a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            ReconcileError::Domain(DomainError::Validation(msg))
            | ReconcileError::Domain(DomainError::InvariantViolation(msg)) => msg.clone(),
            ReconcileError::Domain(e) => e.to_string(),
            _ => match self.api_error() {
                Some(e) if e.is_unreachable() => UNREACHABLE_MESSAGE.to_string(),
                Some(e) => e
                    .backend_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
                None => GENERIC_FAILURE_MESSAGE.to_string(),
            },
        }
    }
}
