//! Reconciliation session: one operator's pass over the stock movements.
//!
//! The session owns the movement list fetched from the backend, the physical
//! count overlay and the explanation sequencer, and drives the submitter. All
//! state lives here and is passed explicitly to the domain functions; nothing
//! is global.

use cokins_core::{DomainError, MovementId};
use cokins_stock::{
    CountPolicy, Discrepancy, PhysicalCountOverlay, ReconcileState, Sequencer, StockMovement,
    compute_discrepancy, discrepancies,
};

use crate::api::{ApiError, StockMovementApi};
use crate::error::ReconcileError;
use crate::submitter::{Explanation, ReconciliationSubmitter, SubmitReceipt};

/// Result of a reconciliation step that went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operator must explain this movement's discrepancy next.
    NeedsExplanation(MovementId),
    /// Every correction has been written; the session is idle again.
    Reconciled(SubmitReceipt),
}

pub struct ReconciliationSession<A> {
    submitter: ReconciliationSubmitter<A>,
    movements: Vec<StockMovement>,
    overlay: PhysicalCountOverlay,
    sequencer: Sequencer,
}

impl<A: StockMovementApi> ReconciliationSession<A> {
    pub fn new(api: A, policy: CountPolicy) -> Self {
        Self {
            submitter: ReconciliationSubmitter::new(api),
            movements: Vec::new(),
            overlay: PhysicalCountOverlay::new(policy),
            sequencer: Sequencer::new(),
        }
    }

    /// Fetch the movement list from the backend, replacing the local copy.
    pub async fn load(&mut self) -> Result<usize, ReconcileError> {
        let movements = self
            .submitter
            .api()
            .list_movements()
            .await
            .map_err(ReconcileError::Fetch)?;
        self.movements = movements;
        Ok(self.movements.len())
    }

    pub fn movements(&self) -> &[StockMovement] {
        &self.movements
    }

    pub fn movement(&self, movement_id: &MovementId) -> Option<&StockMovement> {
        self.movements.iter().find(|m| m.id() == movement_id)
    }

    pub fn overlay(&self) -> &PhysicalCountOverlay {
        &self.overlay
    }

    pub fn state(&self) -> &ReconcileState {
        self.sequencer.state()
    }

    /// Movement whose discrepancy the operator is being asked to explain.
    pub fn pending_explanation(&self) -> Option<&StockMovement> {
        self.sequencer.awaiting().and_then(|id| self.movement(id))
    }

    pub fn set_count(&mut self, movement_id: &MovementId, raw: &str) -> Result<u64, ReconcileError> {
        if self.movement(movement_id).is_none() {
            return Err(DomainError::not_found().into());
        }
        Ok(self.overlay.set_count(movement_id, raw)?)
    }

    pub fn get_count(&self, movement_id: &MovementId) -> Option<u64> {
        self.movement(movement_id).map(|m| self.overlay.get_count(m))
    }

    pub fn discrepancy(&self, movement_id: &MovementId) -> Option<i64> {
        self.movement(movement_id)
            .map(|m| compute_discrepancy(m, &self.overlay))
    }

    pub fn discrepancies(&self) -> Vec<Discrepancy> {
        discrepancies(&self.movements, &self.overlay)
    }

    /// Start (or resume) reconciliation.
    ///
    /// With no discrepancies the corrected set is written straight away. While
    /// an explanation is already pending this just reports it again.
    pub async fn request_reconciliation(&mut self) -> Result<Outcome, ReconcileError> {
        if let ReconcileState::AwaitingExplanation(id) = self.sequencer.state() {
            return Ok(Outcome::NeedsExplanation(id.clone()));
        }
        if *self.sequencer.state() == ReconcileState::ReadyToSubmit {
            // Counts may have changed since the failed write.
            self.sequencer.cancel();
        }

        self.overlay.ensure_valid()?;
        let state = self.sequencer.request(&self.movements, &self.overlay)?;
        if let ReconcileState::AwaitingExplanation(id) = state {
            tracing::info!(movement_id = %id, "discrepancy needs an explanation");
            return Ok(Outcome::NeedsExplanation(id.clone()));
        }

        // ReadyToSubmit: a failure here keeps the state, so calling again retries.
        let receipt = match self
            .submitter
            .submit(&self.movements, &self.overlay, None)
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => return Err(self.resync_on_conflict(e).await),
        };
        self.apply_receipt(&receipt);
        self.sequencer.complete()?;
        self.refresh_after_write().await;
        Ok(Outcome::Reconciled(receipt))
    }

    /// Save the operator's explanation for the pending movement and write its
    /// correction. On failure nothing changes, so the same call can be retried.
    pub async fn save_explanation(&mut self, text: &str) -> Result<Outcome, ReconcileError> {
        let movement_id = self
            .sequencer
            .awaiting()
            .cloned()
            .ok_or_else(|| DomainError::invariant("no discrepancy is awaiting an explanation"))?;
        let explanation = Explanation::new(movement_id, text)?;

        let receipt = match self
            .submitter
            .submit(&self.movements, &self.overlay, Some(&explanation))
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => return Err(self.resync_on_conflict(e).await),
        };
        self.apply_receipt(&receipt);

        let next = self
            .sequencer
            .explanation_saved(&self.movements, &self.overlay)?
            .clone();
        self.refresh_after_write().await;

        match next {
            ReconcileState::AwaitingExplanation(id) => Ok(Outcome::NeedsExplanation(id)),
            _ => {
                // The bulk write that just succeeded already carried every
                // remaining correction.
                self.sequencer.complete()?;
                Ok(Outcome::Reconciled(receipt))
            }
        }
    }

    /// Stop asking for explanations. Corrections already written stay written;
    /// entered counts are kept.
    pub fn cancel(&mut self) {
        self.sequencer.cancel();
    }

    /// Leave the workflow entirely, discarding entered counts.
    pub fn abandon(&mut self) {
        self.sequencer.cancel();
        self.overlay.clear();
    }

    /// Fold a successful write into local state and drop the overlay entries
    /// it persisted. Held entries (corrections still awaiting their own
    /// explanation) stay in the overlay.
    fn apply_receipt(&mut self, receipt: &SubmitReceipt) {
        for written in &receipt.written {
            let Some(local) = self.movements.iter_mut().find(|m| m.id() == written.id()) else {
                continue;
            };
            if self.overlay.get_count(local) == written.quantity {
                self.overlay.clear_movement(written.id());
            }
            local.quantity = written.quantity;
        }

        if let Some(explanation) = &receipt.explained {
            if let Some(local) = self
                .movements
                .iter_mut()
                .find(|m| m.id() == explanation.movement_id())
            {
                local.comment = Some(explanation.text().to_string());
            }
        }

        // Stored versions from the backend, when it reports them.
        if let Some(stored) = &receipt.ack.movements {
            for fresh in stored {
                if let Some(local) = self.movements.iter_mut().find(|m| m.id() == fresh.id()) {
                    *local = fresh.clone();
                }
            }
        }
    }

    /// After a version conflict, pull the stored documents so the next attempt
    /// carries current versions. Counts and the pending explanation are kept.
    async fn resync_on_conflict(&mut self, err: ReconcileError) -> ReconcileError {
        if !matches!(err, ReconcileError::BulkWrite(ApiError::Conflict(_))) {
            return err;
        }
        match self.load().await {
            Ok(count) => tracing::info!(count, "reloaded stock movements after version conflict"),
            Err(e) => tracing::warn!(error = %e, "reload after version conflict failed"),
        }
        err
    }

    async fn refresh_after_write(&mut self) {
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "refetch after reconciliation failed; keeping local copy");
        }
    }
}
