use axum::{
    routing::{get, patch, post},
    Router,
};

pub mod stock_movements;
pub mod system;

/// Router for the `/api` endpoints.
///
/// The list path is camel-cased while the write paths are lower-cased; both
/// spellings are what existing clients call.
pub fn router() -> Router {
    Router::new()
        .route("/stockMovement", get(stock_movements::list_movements))
        .route(
            "/stockmovement/update-comment/:movement_id",
            patch(stock_movements::update_comment),
        )
        .route("/stockmovement/reconcile", post(stock_movements::reconcile))
}
