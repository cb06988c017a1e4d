//! HTTP implementation of [`StockMovementApi`] over `reqwest`.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};

use cokins_core::MovementId;
use cokins_stock::StockMovement;

use crate::api::{ApiError, ReconcileAck, StockMovementApi};
use crate::config::ClientConfig;

/// Talks to the stock movement REST endpoints.
///
/// One `reqwest::Client` is shared by every call; the configured request
/// timeout bounds each of them, so a hung backend surfaces as
/// [`ApiError::Timeout`] instead of stalling the workflow.
#[derive(Debug, Clone)]
pub struct HttpStockMovementApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl HttpStockMovementApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.auth_token.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(transport_error)?;

        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(error_from_response(resp).await)
        }
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

/// Map a non-2xx response, preferring the backend's `message` field.
async fn error_from_response(resp: Response) -> ApiError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| {
            body.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(text);

    if status == StatusCode::CONFLICT {
        ApiError::Conflict(message)
    } else {
        ApiError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait::async_trait]
impl StockMovementApi for HttpStockMovementApi {
    async fn list_movements(&self) -> Result<Vec<StockMovement>, ApiError> {
        let resp = self
            .send(self.client.get(self.url("/api/stockMovement")))
            .await?;

        let movements: Vec<StockMovement> = resp
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("failed to parse stock movements: {e}")))?;

        tracing::debug!(count = movements.len(), "fetched stock movements");
        Ok(movements)
    }

    async fn update_comment(
        &self,
        movement_id: &MovementId,
        comment: &str,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/stockmovement/update-comment/{movement_id}"));
        self.send(self.client.patch(url).json(&json!({ "comment": comment })))
            .await?;

        tracing::debug!(movement_id = %movement_id, "comment updated");
        Ok(())
    }

    async fn reconcile(&self, movements: &[StockMovement]) -> Result<ReconcileAck, ApiError> {
        let url = self.url("/api/stockmovement/reconcile");
        let resp = self
            .send(self.client.post(url).json(&json!({ "movements": movements })))
            .await?;

        let status = resp.status();
        let text = resp.text().await.map_err(transport_error)?;
        let ack: ReconcileAck = if text.trim().is_empty() {
            ReconcileAck {
                success: true,
                message: None,
                updated: None,
                movements: None,
            }
        } else {
            serde_json::from_str(&text)
                .map_err(|e| ApiError::Parse(format!("failed to parse reconcile response: {e}")))?
        };

        if !ack.success {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: ack.message.unwrap_or_default(),
            });
        }

        tracing::debug!(submitted = movements.len(), updated = ?ack.updated, "reconcile accepted");
        Ok(ack)
    }
}
