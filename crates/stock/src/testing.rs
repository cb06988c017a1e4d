//! Fixtures shared by the unit tests in this crate.

use chrono::{TimeZone, Utc};

use crate::movement::{AdjustmentType, StockMovement};

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
