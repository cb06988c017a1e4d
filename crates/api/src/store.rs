//! Stock movement storage.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use cokins_core::MovementId;
use cokins_stock::StockMovement;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("stock movement {0} not found")]
    NotFound(MovementId),

    /// The submitted document version is stale; nothing was written.
    #[error(
        "stock movement {id} was modified since it was loaded (stored version {stored}, submitted {submitted})"
    )]
    Conflict {
        id: MovementId,
        stored: u64,
        submitted: u64,
    },

    #[error("{0}")]
    Validation(String),

    #[error("store unavailable")]
    Unavailable,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("seed file is not a JSON array of stock movements: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Storage abstraction for stock movement documents.
pub trait MovementStore: Send + Sync {
    /// All movements, oldest first (ties broken by id).
    fn list(&self) -> Vec<StockMovement>;
    fn get(&self, id: &MovementId) -> Option<StockMovement>;
    fn insert(&self, movement: StockMovement);
    fn update_comment(&self, id: &MovementId, comment: String)
    -> Result<StockMovement, StoreError>;
    /// Apply submitted quantities all-or-nothing and return the stored result.
    ///
    /// Every submitted movement must exist and carry the stored version.
    /// Movements whose quantity changes get their version bumped.
    fn reconcile(&self, movements: &[StockMovement]) -> Result<Vec<StockMovement>, StoreError>;
}

impl<S> MovementStore for Arc<S>
where
    S: MovementStore + ?Sized,
{
    fn list(&self) -> Vec<StockMovement> {
        (**self).list()
    }

    fn get(&self, id: &MovementId) -> Option<StockMovement> {
        (**self).get(id)
    }

    fn insert(&self, movement: StockMovement) {
        (**self).insert(movement)
    }

    fn update_comment(
        &self,
        id: &MovementId,
        comment: String,
    ) -> Result<StockMovement, StoreError> {
        (**self).update_comment(id, comment)
    }

    fn reconcile(&self, movements: &[StockMovement]) -> Result<Vec<StockMovement>, StoreError> {
        (**self).reconcile(movements)
    }
}

/// In-memory store for dev/tests.
#[derive(Debug, Default)]
pub struct InMemoryMovementStore {
    inner: RwLock<HashMap<MovementId, StockMovement>>,
}

impl InMemoryMovementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movements(movements: impl IntoIterator<Item = StockMovement>) -> Self {
        let store = Self::new();
        for m in movements {
            store.insert(m);
        }
        store
    }

    /// Load a JSON array of movements; returns how many were inserted.
    pub fn seed_from_file(&self, path: &Path) -> Result<usize, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        let movements: Vec<StockMovement> = serde_json::from_str(&raw)?;
        let count = movements.len();
        for m in movements {
            self.insert(m);
        }
        Ok(count)
    }
}

impl MovementStore for InMemoryMovementStore {
    fn list(&self) -> Vec<StockMovement> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let mut all: Vec<StockMovement> = map.values().cloned().collect();
        all.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.movement_id.cmp(&b.movement_id)));
        all
    }

    fn get(&self, id: &MovementId) -> Option<StockMovement> {
        let map = self.inner.read().ok()?;
        map.get(id).cloned()
    }

    fn insert(&self, movement: StockMovement) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(movement.movement_id.clone(), movement);
        }
    }

    fn update_comment(
        &self,
        id: &MovementId,
        comment: String,
    ) -> Result<StockMovement, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Unavailable)?;
        let stored = map
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        stored.comment = Some(comment);
        Ok(stored.clone())
    }

    fn reconcile(&self, movements: &[StockMovement]) -> Result<Vec<StockMovement>, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Unavailable)?;

        // Validate everything before touching anything.
        let mut seen = HashSet::new();
        for sent in movements {
            if !seen.insert(sent.id()) {
                return Err(StoreError::Validation(format!(
                    "stock movement {} submitted more than once",
                    sent.id()
                )));
            }
            let stored = map
                .get(sent.id())
                .ok_or_else(|| StoreError::NotFound(sent.id().clone()))?;
            if stored.version != sent.version {
                return Err(StoreError::Conflict {
                    id: sent.id().clone(),
                    stored: stored.version,
                    submitted: sent.version,
                });
            }
        }

        let mut result = Vec::with_capacity(movements.len());
        for sent in movements {
            if let Some(stored) = map.get_mut(sent.id()) {
                if stored.quantity != sent.quantity {
                    stored.quantity = sent.quantity;
                    stored.version += 1;
                }
                result.push(stored.clone());
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cokins_stock::AdjustmentType;

    fn movement(id: &str, quantity: u64, day: u32) -> StockMovement {
        StockMovement {
            movement_id: id.parse().unwrap(),
            product_id: "p".parse().unwrap(),
            description: String::new(),
            category: String::new(),
            adjustment_type: AdjustmentType::Sold,
            quantity,
            date: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            comment: None,
            version: 0,
        }
    }

    #[test]
    fn list_is_ordered_by_date_then_id() {
        let store = InMemoryMovementStore::with_movements(vec![
            movement("b", 1, 2),
            movement("c", 1, 1),
            movement("a", 1, 2),
        ]);
        let ids: Vec<String> = store.list().into_iter().map(|m| m.movement_id.into()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn reconcile_bumps_version_only_when_quantity_changes() {
        let store = InMemoryMovementStore::with_movements(vec![movement("a", 5, 1), movement("b", 5, 1)]);
        let out = store
            .reconcile(&[movement("a", 6, 1), movement("b", 5, 1)])
            .unwrap();
        assert_eq!(out[0].version, 1);
        assert_eq!(out[0].quantity, 6);
        assert_eq!(out[1].version, 0);
    }

    #[test]
    fn stale_version_rejects_whole_batch() {
        let store = InMemoryMovementStore::with_movements(vec![movement("a", 5, 1), movement("b", 5, 1)]);
        store.reconcile(&[movement("b", 4, 1)]).unwrap();

        // Second operator still holds version 0 of `b`.
        let err = store
            .reconcile(&[movement("a", 9, 1), movement("b", 3, 1)])
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { stored: 1, submitted: 0, .. }));
        assert_eq!(store.get(&"a".parse().unwrap()).unwrap().quantity, 5);
        assert_eq!(store.get(&"b".parse().unwrap()).unwrap().quantity, 4);
    }

    #[test]
    fn unknown_and_duplicate_movements_are_rejected() {
        let store = InMemoryMovementStore::with_movements(vec![movement("a", 5, 1)]);
        assert!(matches!(
            store.reconcile(&[movement("zzz", 1, 1)]),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.reconcile(&[movement("a", 1, 1), movement("a", 2, 1)]),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn update_comment_keeps_version() {
        let store = InMemoryMovementStore::with_movements(vec![movement("a", 5, 1)]);
        let updated = store
            .update_comment(&"a".parse().unwrap(), "water damage".into())
            .unwrap();
        assert_eq!(updated.comment.as_deref(), Some("water damage"));
        assert_eq!(updated.version, 0);
    }
}
