//! Stock movement reconciliation domain.
//!
//! This crate holds the reconciliation business rules as deterministic domain
//! logic (no IO, no HTTP, no storage): the movement model, the operator's
//! physical count overlay, discrepancy calculation, the explanation sequencer,
//! and the corrected-quantity builder used when writing counts back.

pub mod discrepancy;
pub mod movement;
pub mod overlay;
pub mod sequencer;

pub use discrepancy::{
    Discrepancy, compute_discrepancy, corrected_movements, discrepancies, first_unexplained,
};
pub use movement::{AdjustmentType, StockMovement};
pub use overlay::{CountPolicy, PhysicalCountOverlay};
pub use sequencer::{ReconcileState, Sequencer};

#[cfg(test)]
pub(crate) mod testing;
