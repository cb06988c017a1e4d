//! Discrepancy resolution sequencer.
//!
//! Walks the movements whose physical count disagrees with the system one at a
//! time, so each correction is written only together with an explanation.
//! Transitions take the movements and overlay as arguments; the sequencer owns
//! no IO and never talks to the backend itself.

use std::collections::HashSet;

use serde::Serialize;

use cokins_core::{DomainError, DomainResult, MovementId};

use crate::discrepancy::first_unexplained;
use crate::movement::StockMovement;
use crate::overlay::PhysicalCountOverlay;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "movement_id", rename_all = "snake_case")]
pub enum ReconcileState {
    #[default]
    Idle,
    /// Waiting for the operator to explain this movement's discrepancy.
    AwaitingExplanation(MovementId),
    /// No unexplained discrepancy remains; the corrected set may be written.
    ReadyToSubmit,
}

impl ReconcileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileState::Idle => "idle",
            ReconcileState::AwaitingExplanation(_) => "awaiting_explanation",
            ReconcileState::ReadyToSubmit => "ready_to_submit",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    state: ReconcileState,
    resolved: HashSet<MovementId>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ReconcileState {
        &self.state
    }

    /// Movement currently awaiting an explanation, if any.
    pub fn awaiting(&self) -> Option<&MovementId> {
        match &self.state {
            ReconcileState::AwaitingExplanation(id) => Some(id),
            _ => None,
        }
    }

    /// Movements explained so far in the current run.
    pub fn resolved(&self) -> &HashSet<MovementId> {
        &self.resolved
    }

    /// `Idle -> AwaitingExplanation(first) | ReadyToSubmit`.
    pub fn request(
        &mut self,
        movements: &[StockMovement],
        overlay: &PhysicalCountOverlay,
    ) -> DomainResult<&ReconcileState> {
        if self.state != ReconcileState::Idle {
            return Err(self.illegal("request reconciliation"));
        }

        self.resolved.clear();
        self.state = self.next_state(movements, overlay);
        tracing::debug!(state = self.state.as_str(), "reconciliation requested");
        Ok(&self.state)
    }

    /// `AwaitingExplanation(m) -> AwaitingExplanation(next) | ReadyToSubmit`.
    pub fn explanation_saved(
        &mut self,
        movements: &[StockMovement],
        overlay: &PhysicalCountOverlay,
    ) -> DomainResult<&ReconcileState> {
        let explained = match &self.state {
            ReconcileState::AwaitingExplanation(id) => id.clone(),
            _ => return Err(self.illegal("save an explanation")),
        };

        self.resolved.insert(explained);
        self.state = self.next_state(movements, overlay);
        tracing::debug!(
            state = self.state.as_str(),
            resolved = self.resolved.len(),
            "explanation saved"
        );
        Ok(&self.state)
    }

    /// `ReadyToSubmit -> Idle`, once the corrected set has been written.
    pub fn complete(&mut self) -> DomainResult<()> {
        if self.state != ReconcileState::ReadyToSubmit {
            return Err(self.illegal("complete reconciliation"));
        }
        self.reset();
        Ok(())
    }

    /// Abandon the current run. Already-written corrections stay written.
    pub fn cancel(&mut self) {
        if self.state != ReconcileState::Idle {
            tracing::info!(
                state = self.state.as_str(),
                resolved = self.resolved.len(),
                "reconciliation cancelled"
            );
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.state = ReconcileState::Idle;
        self.resolved.clear();
    }

    fn next_state(
        &self,
        movements: &[StockMovement],
        overlay: &PhysicalCountOverlay,
    ) -> ReconcileState {
        match first_unexplained(movements, overlay, &self.resolved) {
            Some(m) => ReconcileState::AwaitingExplanation(m.movement_id.clone()),
            None => ReconcileState::ReadyToSubmit,
        }
    }

    fn illegal(&self, action: &str) -> DomainError {
        DomainError::invariant(format!("cannot {action} while {}", self.state.as_str()))
    }
}
