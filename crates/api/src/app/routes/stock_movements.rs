use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use cokins_core::MovementId;

use crate::app::{dto, errors};
use crate::store::MovementStore;

pub async fn list_movements(
    Extension(store): Extension<Arc<dyn MovementStore>>,
) -> axum::response::Response {
    Json(store.list()).into_response()
}

pub async fn update_comment(
    Extension(store): Extension<Arc<dyn MovementStore>>,
    Path(movement_id): Path<String>,
    Json(body): Json<dto::UpdateCommentRequest>,
) -> axum::response::Response {
    let id: MovementId = match movement_id.parse() {
        Ok(id) => id,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{e}"));
        }
    };

    match store.update_comment(&id, body.comment) {
        Ok(updated) => {
            tracing::info!(movement_id = %id, "comment updated");
            Json(updated).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn reconcile(
    Extension(store): Extension<Arc<dyn MovementStore>>,
    Json(body): Json<dto::ReconcileRequest>,
) -> axum::response::Response {
    let before: Vec<(MovementId, u64)> = body
        .movements
        .iter()
        .map(|m| (m.movement_id.clone(), m.version))
        .collect();

    let stored = match store.reconcile(&body.movements) {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(error = %e, "reconcile rejected");
            return errors::store_error_to_response(e);
        }
    };

    let updated = stored
        .iter()
        .zip(&before)
        .filter(|(after, (_, version))| after.version != *version)
        .count();

    tracing::info!(submitted = stored.len(), updated, "stock movements reconciled");

    Json(dto::ReconcileResponse {
        success: true,
        message: format!("Reconciled {} stock movement(s).", stored.len()),
        updated,
        movements: stored,
    })
    .into_response()
}
