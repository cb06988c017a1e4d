use serde::{Deserialize, Serialize};

use cokins_stock::StockMovement;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub movements: Vec<StockMovement>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub message: String,
    /// How many movements had their quantity changed.
    pub updated: usize,
    pub movements: Vec<StockMovement>,
}
