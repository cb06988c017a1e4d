//! In-memory backend double shared by the unit tests in this crate.

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};

use cokins_core::MovementId;
use cokins_stock::{AdjustmentType, StockMovement};

use crate::api::{ApiError, ReconcileAck, StockMovementApi};

pub fn movement(id: &str, quantity: u64) -> StockMovement {
    StockMovement {
        movement_id: id.parse().unwrap(),
        product_id: format!("product-{id}").parse().unwrap(),
        description: format!("Item {id}"),
        category: "General".to_string(),
        adjustment_type: AdjustmentType::Added,
        quantity,
        date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        comment: None,
        version: 0,
    }
}

/// A backend call as observed by [`RecordingApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    UpdateComment(String, String),
    /// `(movement id, quantity)` pairs in the order they were sent.
    Reconcile(Vec<(String, u64)>),
}

#[derive(Debug, Default)]
struct Inner {
    movements: Vec<StockMovement>,
    calls: Vec<Call>,
    list_error: Option<ApiError>,
    comment_error: Option<ApiError>,
    reconcile_error: Option<ApiError>,
}

/// Records every call and applies writes to its own copy of the movements.
#[derive(Debug, Clone, Default)]
pub struct RecordingApi {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingApi {
    pub fn new(movements: Vec<StockMovement>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                movements,
                ..Inner::default()
            })),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    pub fn stored(&self) -> Vec<StockMovement> {
        self.inner.lock().unwrap().movements.clone()
    }

    pub fn fail_list(&self, err: ApiError) {
        self.inner.lock().unwrap().list_error = Some(err);
    }

    pub fn fail_comments(&self, err: ApiError) {
        self.inner.lock().unwrap().comment_error = Some(err);
    }

    pub fn fail_reconcile(&self, err: ApiError) {
        self.inner.lock().unwrap().reconcile_error = Some(err);
    }

    pub fn heal(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.list_error = None;
        inner.comment_error = None;
        inner.reconcile_error = None;
    }
}

#[async_trait::async_trait]
impl StockMovementApi for RecordingApi {
    async fn list_movements(&self) -> Result<Vec<StockMovement>, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::List);
        if let Some(err) = inner.list_error.clone() {
            return Err(err);
        }
        Ok(inner.movements.clone())
    }

    async fn update_comment(
        &self,
        movement_id: &MovementId,
        comment: &str,
    ) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::UpdateComment(
            movement_id.to_string(),
            comment.to_string(),
        ));
        if let Some(err) = inner.comment_error.clone() {
            return Err(err);
        }
        match inner.movements.iter_mut().find(|m| m.id() == movement_id) {
            Some(m) => {
                m.comment = Some(comment.to_string());
                Ok(())
            }
            None => Err(ApiError::Api {
                status: 404,
                message: "stock movement not found".into(),
            }),
        }
    }

    async fn reconcile(&self, movements: &[StockMovement]) -> Result<ReconcileAck, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Reconcile(
            movements
                .iter()
                .map(|m| (m.movement_id.to_string(), m.quantity))
                .collect(),
        ));
        if let Some(err) = inner.reconcile_error.clone() {
            return Err(err);
        }

        let mut updated = 0;
        for sent in movements {
            if let Some(stored) = inner.movements.iter_mut().find(|m| m.id() == sent.id()) {
                if stored.quantity != sent.quantity {
                    stored.quantity = sent.quantity;
                    stored.version += 1;
                    updated += 1;
                }
            }
        }

        Ok(ReconcileAck {
            success: true,
            message: Some("Stock movements reconciled".into()),
            updated: Some(updated),
            movements: None,
        })
    }
}
