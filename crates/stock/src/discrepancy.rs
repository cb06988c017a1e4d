//! Discrepancies between physical counts and system quantities.
//!
//! Everything here is recomputed from the current movements and overlay on
//! every call; nothing is cached.

use std::collections::HashSet;

use serde::Serialize;

use cokins_core::{DomainResult, MovementId};

use crate::movement::StockMovement;
use crate::overlay::PhysicalCountOverlay;

/// Signed difference for one movement (`counted - system`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub movement_id: MovementId,
    pub system: u64,
    pub counted: u64,
    pub delta: i64,
}

impl Discrepancy {
    /// True when the physical count matches system records.
    pub fn is_match(&self) -> bool {
        self.delta == 0
    }
}

pub fn compute_discrepancy(movement: &StockMovement, overlay: &PhysicalCountOverlay) -> i64 {
    signed_delta(overlay.get_count(movement), movement.quantity)
}

fn signed_delta(counted: u64, system: u64) -> i64 {
    (i128::from(counted) - i128::from(system)).clamp(i128::from(i64::MIN), i128::from(i64::MAX))
        as i64
}

/// One entry per movement, in movement order.
pub fn discrepancies(
    movements: &[StockMovement],
    overlay: &PhysicalCountOverlay,
) -> Vec<Discrepancy> {
    movements
        .iter()
        .map(|m| {
            let counted = overlay.get_count(m);
            Discrepancy {
                movement_id: m.movement_id.clone(),
                system: m.quantity,
                counted,
                delta: signed_delta(counted, m.quantity),
            }
        })
        .collect()
}

/// First movement (in slice order) with a nonzero discrepancy that is not in `resolved`.
pub fn first_unexplained<'a>(
    movements: &'a [StockMovement],
    overlay: &PhysicalCountOverlay,
    resolved: &HashSet<MovementId>,
) -> Option<&'a StockMovement> {
    movements
        .iter()
        .find(|m| !resolved.contains(m.id()) && compute_discrepancy(m, overlay) != 0)
}

/// Build the full list of movements to write back.
///
/// Each movement carries its counted quantity, except movements that still
/// disagree with the system and are not the one being explained: those keep
/// their system quantity until their own explanation is saved.
pub fn corrected_movements(
    movements: &[StockMovement],
    overlay: &PhysicalCountOverlay,
    explaining: Option<&MovementId>,
) -> DomainResult<Vec<StockMovement>> {
    overlay.ensure_valid()?;

    Ok(movements
        .iter()
        .map(|m| {
            let counted = overlay.get_count(m);
            let held = counted != m.quantity && explaining != Some(m.id());
            if held {
                m.clone()
            } else {
                m.with_quantity(counted)
            }
        })
        .collect())
}
