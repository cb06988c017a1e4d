use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cokins_core::{MovementId, ProductId};

/// Kind of stock change a movement records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjustmentType {
    Added,
    Sold,
    Returned,
}

impl AdjustmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentType::Added => "Added",
            AdjustmentType::Sold => "Sold",
            AdjustmentType::Returned => "Returned",
        }
    }
}

impl core::fmt::Display for AdjustmentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded change to a product's quantity.
///
/// Field names follow the backend documents (`_id`, camelCase, `__v`), so the
/// same type is used on both sides of the wire. Only `quantity` and `comment`
/// are ever rewritten by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    #[serde(rename = "_id", alias = "movementId")]
    pub movement_id: MovementId,
    pub product_id: ProductId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub adjustment_type: AdjustmentType,
    pub quantity: u64,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Document version, used for optimistic concurrency on writes.
    #[serde(rename = "__v", default)]
    pub version: u64,
}

impl StockMovement {
    pub fn id(&self) -> &MovementId {
        &self.movement_id
    }

    /// Copy of this movement with a corrected quantity.
    pub fn with_quantity(&self, quantity: u64) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}
