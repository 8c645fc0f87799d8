//! Order intake over HTTP.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};

use contraentrega_integration_tests::{RecordingRelay, TestContext, TestOptions, product};

fn catalog() -> Vec<contraentrega_core::Product> {
    vec![
        product("cafe", "Café", 15_000, 10),
        product("pan", "Pan", 2_500, 1),
    ]
}

fn order(items: &Value, delivery: &str) -> Value {
    json!({
        "name": "Ana",
        "phone": "3001234567",
        "email": "ana@example.co",
        "address": "Calle 5 # 10-20",
        "delivery": delivery,
        "paymentMethod": "COP",
        "items": items,
    })
}

async fn with_relay(relay: Arc<RecordingRelay>) -> TestContext {
    TestContext::start(TestOptions {
        products: catalog(),
        relay: Some(relay),
        ..TestOptions::default()
    })
    .await
}

#[tokio::test]
async fn test_order_without_relay_is_503() {
    let ctx = TestContext::with_products(catalog()).await;

    let resp = ctx
        .post_json("/api/orders", &order(&json!({"cafe": 1}), "pickup"))
        .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_order_is_priced_server_side() {
    let relay = Arc::new(RecordingRelay::default());
    let ctx = with_relay(relay.clone()).await;

    let resp = ctx
        .post_json("/api/orders", &order(&json!({"cafe": 2, "pan": 1}), "delivery"))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 2 * 15_000 + 2_500 + 5_000);
    assert_eq!(body["deliveryFee"], 5_000);
    assert_eq!(body["paymentMethod"], "COP");
    let order_id = body["orderId"].as_str().unwrap();
    assert!(order_id.starts_with("ORD-") && order_id.len() == 10);
    assert_eq!(*relay.orders.lock().unwrap(), vec![order_id.to_string()]);
}

#[tokio::test]
async fn test_pickup_order_has_no_delivery_fee() {
    let ctx = with_relay(Arc::new(RecordingRelay::default())).await;

    let resp = ctx
        .post_json("/api/orders", &order(&json!({"@cafe": 1}), "pickup"))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["deliveryFee"], 0);
    assert_eq!(body["total"], 15_000);
}

#[tokio::test]
async fn test_invalid_orders_are_400() {
    let relay = Arc::new(RecordingRelay::default());
    let ctx = with_relay(relay.clone()).await;

    let cases = [
        order(&json!({}), "pickup"),
        order(&json!({"cafe": 0}), "pickup"),
        order(&json!({"ghost": 1}), "pickup"),
        order(&json!({"pan": 2}), "pickup"),
        json!({"name": "Ana", "phone": "1", "email": "nope", "items": {"cafe": 1}}),
        json!({"name": "Ana", "phone": "1", "email": "a@b.co", "delivery": "delivery", "items": {"cafe": 1}}),
        json!({"name": "Ana"}),
    ];
    for case in &cases {
        let resp = ctx.post_json("/api/orders", case).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{case}");
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());
    }
    assert!(relay.orders.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_same_product_under_two_keys_cannot_exceed_stock() {
    let relay = Arc::new(RecordingRelay::default());
    let ctx = with_relay(relay.clone()).await;

    let resp = ctx
        .post_json("/api/orders", &order(&json!({"pan": 1, "@pan": 1}), "pickup"))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(relay.orders.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_relay_failure_is_502() {
    let relay = Arc::new(RecordingRelay {
        fail: true,
        ..RecordingRelay::default()
    });
    let ctx = with_relay(relay).await;

    let resp = ctx
        .post_json("/api/orders", &order(&json!({"cafe": 1}), "pickup"))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}
