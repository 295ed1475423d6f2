mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{send, setup, token};

fn order_body(items: Value) -> Value {
    json!({
        "address": {
            "country": "Russia",
            "region": "Moscow",
            "city": "Moscow",
            "street": "Tverskaya",
            "house": "1",
            "flat": "12",
            "index": "125009"
        },
        "items": items
    })
}

#[tokio::test]
async fn test_place_and_list_orders() {
    let app = setup().await;
    let alice = token(1, "alice");

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/v1/orders",
        Some(&alice),
        Some(order_body(json!([
            { "product_id": 1, "quantity": 2 },
            { "product_id": 2, "quantity": 3 }
        ]))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["cost"], "32.97");
    assert_eq!(body["cost_minor"], 3297);
    let order_id = body["order_id"].as_i64().unwrap();

    let (status, body) = send(&app.router, Method::GET, "/v1/orders", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order_id);
    assert_eq!(orders[0]["status"], "new");
    assert_eq!(orders[0]["items"][1]["quantity"], 3);

    let (_, body) = send(
        &app.router,
        Method::GET,
        "/v1/orders",
        Some(&token(2, "bob")),
        None,
    )
    .await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_rejected_orders_are_bad_requests() {
    let app = setup().await;
    let alice = token(1, "alice");

    for items in [
        json!([]),
        json!([{ "product_id": 1, "quantity": 0 }]),
        json!([{ "product_id": 99, "quantity": 1 }]),
    ] {
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/v1/orders",
            Some(&alice),
            Some(order_body(items)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    let (_, body) = send(&app.router, Method::GET, "/v1/orders", Some(&alice), None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_orders_require_token() {
    let app = setup().await;
    let (status, _) = send(
        &app.router,
        Method::POST,
        "/v1/orders",
        None,
        Some(order_body(json!([{ "product_id": 1, "quantity": 1 }]))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
