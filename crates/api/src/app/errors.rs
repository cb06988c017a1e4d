use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use crate::store::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        StoreError::Conflict { .. } => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        StoreError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        StoreError::Unavailable => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            err.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let id: cokins_core::MovementId = "m1".parse().unwrap();
        let cases = [
            (StoreError::NotFound(id.clone()), StatusCode::NOT_FOUND),
            (
                StoreError::Conflict {
                    id,
                    stored: 2,
                    submitted: 1,
                },
                StatusCode::CONFLICT,
            ),
            (StoreError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (StoreError::Unavailable, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(store_error_to_response(err).status(), status);
        }
    }
}
