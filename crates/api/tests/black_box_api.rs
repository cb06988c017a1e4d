use std::sync::Arc;

use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use serde_json::json;

use cokins_api::store::{InMemoryMovementStore, MovementStore};
use cokins_stock::{AdjustmentType, StockMovement};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(movements: Vec<StockMovement>) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let store: Arc<dyn MovementStore> =
            Arc::new(InMemoryMovementStore::with_movements(movements));
        let app = cokins_api::app::build_app(store);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn movement(id: &str, quantity: u64, day: u32) -> StockMovement {
    StockMovement {
        movement_id: id.parse().unwrap(),
        product_id: format!("product-{id}").parse().unwrap(),
        description: format!("Item {id}"),
        category: "General".into(),
        adjustment_type: AdjustmentType::Added,
        quantity,
        date: Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap(),
        comment: None,
        version: 0,
    }
}

async fn list(client: &reqwest::Client, base_url: &str) -> Vec<serde_json::Value> {
    let res = client
        .get(format!("{}/api/stockMovement", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn(vec![]).await;

    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn lists_movements_in_date_order_with_backend_field_names() {
    let srv = TestServer::spawn(vec![movement("late", 3, 20), movement("early", 5, 2)]).await;
    let client = reqwest::Client::new();

    let body = list(&client, &srv.base_url).await;
    assert_eq!(body.len(), 2);
    assert_eq!(body[0]["_id"], "early");
    assert_eq!(body[0]["productId"], "product-early");
    assert_eq!(body[0]["adjustmentType"], "Added");
    assert_eq!(body[0]["__v"], 0);
    assert_eq!(body[1]["_id"], "late");
}

#[tokio::test]
async fn comment_update_and_unknown_movement() {
    let srv = TestServer::spawn(vec![movement("m1", 5, 1)]).await;
    let client = reqwest::Client::new();

    let res = client
        .patch(format!("{}/api/stockmovement/update-comment/m1", srv.base_url))
        .json(&json!({ "comment": "two broken in transit" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["comment"], "two broken in transit");
    assert_eq!(updated["__v"], 0);

    let res = client
        .patch(format!("{}/api/stockmovement/update-comment/nope", srv.base_url))
        .json(&json!({ "comment": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn reconcile_writes_quantities_and_bumps_changed_versions() {
    let srv = TestServer::spawn(vec![movement("a", 10, 1), movement("b", 5, 2)]).await;
    let client = reqwest::Client::new();

    let current = list(&client, &srv.base_url).await;
    let mut submitted = current.clone();
    submitted[1]["quantity"] = json!(3);

    let res = client
        .post(format!("{}/api/stockmovement/reconcile", srv.base_url))
        .json(&json!({ "movements": submitted }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ack: serde_json::Value = res.json().await.unwrap();
    assert_eq!(ack["success"], true);
    assert_eq!(ack["updated"], 1);

    let after = list(&client, &srv.base_url).await;
    assert_eq!(after[0]["quantity"], 10);
    assert_eq!(after[0]["__v"], 0);
    assert_eq!(after[1]["quantity"], 3);
    assert_eq!(after[1]["__v"], 1);
}

#[tokio::test]
async fn stale_version_is_a_conflict_and_writes_nothing() {
    let srv = TestServer::spawn(vec![movement("a", 10, 1), movement("b", 5, 2)]).await;
    let client = reqwest::Client::new();

    let snapshot = list(&client, &srv.base_url).await;

    // First operator corrects `b`.
    let mut first = snapshot.clone();
    first[1]["quantity"] = json!(4);
    let res = client
        .post(format!("{}/api/stockmovement/reconcile", srv.base_url))
        .json(&json!({ "movements": first }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Second operator submits from the old snapshot.
    let mut second = snapshot;
    second[0]["quantity"] = json!(9);
    second[1]["quantity"] = json!(2);
    let res = client
        .post(format!("{}/api/stockmovement/reconcile", srv.base_url))
        .json(&json!({ "movements": second }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "conflict");

    let after = list(&client, &srv.base_url).await;
    assert_eq!(after[0]["quantity"], 10);
    assert_eq!(after[1]["quantity"], 4);
}
