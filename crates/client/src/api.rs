//! Backend store interface for stock movements.
//!
//! The session and submitter only ever talk to the backend through this trait,
//! so they can be driven by the HTTP client in production and by an in-memory
//! double in tests.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cokins_core::MovementId;
use cokins_stock::StockMovement;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Message supplied by the backend, when it sent one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Api { message, .. } | ApiError::Conflict(message)
                if !message.trim().is_empty() =>
            {
                Some(message)
            }
            _ => None,
        }
    }

    /// True when the backend could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }
}

/// Backend acknowledgement of a bulk reconciliation write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileAck {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub updated: Option<u64>,
    /// Movements as stored after the write (new versions included), if returned.
    #[serde(default)]
    pub movements: Option<Vec<StockMovement>>,
}

fn default_success() -> bool {
    true
}

#[async_trait::async_trait]
pub trait StockMovementApi: Send + Sync {
    /// `GET /api/stockMovement`
    async fn list_movements(&self) -> Result<Vec<StockMovement>, ApiError>;

    /// `PATCH /api/stockmovement/update-comment/:movementId`
    async fn update_comment(&self, movement_id: &MovementId, comment: &str)
    -> Result<(), ApiError>;

    /// `POST /api/stockmovement/reconcile`
    async fn reconcile(&self, movements: &[StockMovement]) -> Result<ReconcileAck, ApiError>;
}

#[async_trait::async_trait]
impl<S> StockMovementApi for Arc<S>
where
    S: StockMovementApi + ?Sized,
{
    async fn list_movements(&self) -> Result<Vec<StockMovement>, ApiError> {
        (**self).list_movements().await
    }

    async fn update_comment(
        &self,
        movement_id: &MovementId,
        comment: &str,
    ) -> Result<(), ApiError> {
        (**self).update_comment(movement_id, comment).await
    }

    async fn reconcile(&self, movements: &[StockMovement]) -> Result<ReconcileAck, ApiError> {
        (**self).reconcile(movements).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_ignores_blank_and_transport_errors() {
        let api = ApiError::Api {
            status: 500,
            message: "database unavailable".into(),
        };
        assert_eq!(api.backend_message(), Some("database unavailable"));

        let blank = ApiError::Api {
            status: 502,
            message: "  ".into(),
        };
        assert_eq!(blank.backend_message(), None);

        assert_eq!(ApiError::Timeout.backend_message(), None);
        assert!(ApiError::Timeout.is_unreachable());
        assert!(!ApiError::Conflict("stale".into()).is_unreachable());
    }

    #[test]
    fn ack_defaults_to_success_when_body_is_sparse() {
        let ack: ReconcileAck = serde_json::from_str("{}").unwrap();
        assert!(ack.success);
        assert!(ack.movements.is_none());

        let ack: ReconcileAck =
            serde_json::from_str(r#"{"success":false,"message":"no"}"#).unwrap();
        assert!(!ack.success);
        assert_eq!(ack.message.as_deref(), Some("no"));
    }
}
