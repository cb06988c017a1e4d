//! Operator-entered physical counts, layered over system quantities.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use cokins_core::{DomainError, DomainResult, MovementId};

use crate::movement::StockMovement;

/// What to do with a physical count entry that is not a non-negative integer.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountPolicy {
    /// Store 0 (the item is treated as fully depleted).
    #[default]
    #[serde(rename = "coerce")]
    CoerceToZero,
    /// Store nothing and block submission until the entry is corrected.
    Reject,
}

impl core::str::FromStr for CountPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coerce" | "zero" => Ok(CountPolicy::CoerceToZero),
            "reject" => Ok(CountPolicy::Reject),
            other => Err(DomainError::validation(format!(
                "unknown count policy '{other}' (expected coerce or reject)"
            ))),
        }
    }
}

/// In-memory, not-yet-persisted physical counts keyed by movement.
///
/// A movement with no entry counts as its own system quantity, so it shows no
/// discrepancy until the operator touches it.
#[derive(Debug, Clone, Default)]
pub struct PhysicalCountOverlay {
    policy: CountPolicy,
    counts: HashMap<MovementId, u64>,
    invalid: BTreeMap<MovementId, String>,
}

impl PhysicalCountOverlay {
    pub fn new(policy: CountPolicy) -> Self {
        Self {
            policy,
            counts: HashMap::new(),
            invalid: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> CountPolicy {
        self.policy
    }

    /// Record the operator's count for one movement and return the stored value.
    pub fn set_count(&mut self, movement_id: &MovementId, raw: &str) -> DomainResult<u64> {
        match raw.trim().parse::<u64>() {
            Ok(value) => {
                self.invalid.remove(movement_id);
                self.counts.insert(movement_id.clone(), value);
                Ok(value)
            }
            Err(_) => match self.policy {
                CountPolicy::CoerceToZero => {
                    tracing::warn!(
                        movement_id = %movement_id,
                        raw,
                        "physical count is not a whole number; recording 0"
                    );
                    self.invalid.remove(movement_id);
                    self.counts.insert(movement_id.clone(), 0);
                    Ok(0)
                }
                CountPolicy::Reject => {
                    self.counts.remove(movement_id);
                    self.invalid.insert(movement_id.clone(), raw.to_string());
                    Err(DomainError::validation(format!(
                        "physical count for {movement_id} must be a whole number, got '{raw}'"
                    )))
                }
            },
        }
    }

    /// The counted quantity for `movement`, or its system quantity when untouched.
    pub fn get_count(&self, movement: &StockMovement) -> u64 {
        self.counts
            .get(movement.id())
            .copied()
            .unwrap_or(movement.quantity)
    }

    pub fn has_entry(&self, movement_id: &MovementId) -> bool {
        self.counts.contains_key(movement_id)
    }

    /// Entries rejected under [`CountPolicy::Reject`], with the raw text typed.
    pub fn invalid_entries(&self) -> &BTreeMap<MovementId, String> {
        &self.invalid
    }

    pub fn ensure_valid(&self) -> DomainResult<()> {
        if self.invalid.is_empty() {
            return Ok(());
        }
        let ids: Vec<&str> = self.invalid.keys().map(MovementId::as_str).collect();
        Err(DomainError::validation(format!(
            "fix invalid physical counts before reconciling: {}",
            ids.join(", ")
        )))
    }

    pub fn clear_movement(&mut self, movement_id: &MovementId) {
        self.counts.remove(movement_id);
        self.invalid.remove(movement_id);
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.invalid.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty() && self.invalid.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }
}
