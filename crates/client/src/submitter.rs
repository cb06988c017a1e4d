//! Writes reconciled quantities (and explanations) back to the backend.

use serde::Serialize;

use cokins_core::{DomainError, DomainResult, MovementId};
use cokins_stock::{PhysicalCountOverlay, StockMovement, corrected_movements};

use crate::api::{ReconcileAck, StockMovementApi};
use crate::error::ReconcileError;

/// Operator's reason for one movement's discrepancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    movement_id: MovementId,
    text: String,
}

impl Explanation {
    pub fn new(movement_id: MovementId, text: &str) -> DomainResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::validation("explanation cannot be empty"));
        }
        Ok(Self {
            movement_id,
            text: text.to_string(),
        })
    }

    pub fn movement_id(&self) -> &MovementId {
        &self.movement_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// What a successful submission wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// Every movement sent in the bulk write, with the quantity that was sent.
    pub written: Vec<StockMovement>,
    /// Movements whose quantity changed.
    pub corrected: Vec<MovementId>,
    /// Movement whose comment was updated first, if any.
    pub explained: Option<Explanation>,
    pub ack: ReconcileAck,
}

/// Sends one reconciliation step: an optional comment update, then a single
/// bulk write of the full corrected set.
///
/// The submitter never touches the overlay; callers clear it only after a
/// successful receipt, so a failure leaves every entered count in place.
#[derive(Debug, Clone)]
pub struct ReconciliationSubmitter<A> {
    api: A,
}

impl<A: StockMovementApi> ReconciliationSubmitter<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn submit(
        &self,
        movements: &[StockMovement],
        overlay: &PhysicalCountOverlay,
        explanation: Option<&Explanation>,
    ) -> Result<SubmitReceipt, ReconcileError> {
        let explaining = explanation.map(Explanation::movement_id);
        let written = corrected_movements(movements, overlay, explaining)?;

        if let Some(explanation) = explanation {
            if !movements.iter().any(|m| m.id() == explanation.movement_id()) {
                return Err(DomainError::not_found().into());
            }

            self.api
                .update_comment(explanation.movement_id(), explanation.text())
                .await
                .map_err(|e| {
                    tracing::warn!(
                        movement_id = %explanation.movement_id(),
                        error = %e,
                        "comment update failed; skipping bulk write"
                    );
                    ReconcileError::CommentUpdate(e)
                })?;
        }

        let ack = self.api.reconcile(&written).await.map_err(|e| {
            tracing::warn!(error = %e, "reconciliation write failed");
            ReconcileError::BulkWrite(e)
        })?;

        let corrected: Vec<MovementId> = movements
            .iter()
            .zip(&written)
            .filter(|(before, after)| before.quantity != after.quantity)
            .map(|(m, _)| m.movement_id.clone())
            .collect();

        tracing::info!(
            submitted = written.len(),
            corrected = corrected.len(),
            explained = ?explaining.map(MovementId::as_str),
            "stock movements reconciled"
        );

        Ok(SubmitReceipt {
            written,
            corrected,
            explained: explanation.cloned(),
            ack,
        })
    }
}
