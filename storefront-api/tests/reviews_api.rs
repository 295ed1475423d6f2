mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{send, setup, token};

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = setup().await;
    let (status, body) = send(&app.router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let app = setup().await;

    let (status, body) = send(&app.router, Method::GET, "/v1/products/1/reviews", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app.router,
        Method::GET,
        "/v1/products/1/reviews",
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_review_lifecycle_updates_rating() {
    let app = setup().await;
    let alice = token(1, "alice");
    let bob = token(2, "bob");

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/v1/reviews",
        Some(&alice),
        Some(json!({ "product_id": 1, "rating": 3, "content": "ok" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/v1/reviews",
        Some(&bob),
        Some(json!({ "product_id": 1, "rating": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.store.product_rating(1).await, Some(4.0));

    let (status, _) = send(
        &app.router,
        Method::PUT,
        "/v1/reviews",
        Some(&alice),
        Some(json!({ "product_id": 1, "rating": 4, "content": "better" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.store.product_rating(1).await, Some(4.5));

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/v1/products/1/reviews",
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["user_name"], "alice");
    assert_eq!(body[0]["content"], "better");

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/v1/users/bob/reviews",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["rating"], 5);

    let (status, _) = send(&app.router, Method::DELETE, "/v1/reviews/1", Some(&bob), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.store.product_rating(1).await, Some(4.0));
}

#[tokio::test]
async fn test_review_error_statuses() {
    let app = setup().await;
    let alice = token(1, "alice");
    let review = json!({ "product_id": 1, "rating": 4 });

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/v1/reviews",
        Some(&alice),
        Some(json!({ "product_id": 1, "rating": 6 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains('6'));

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/v1/reviews",
        Some(&alice),
        Some(review.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app.router,
        Method::POST,
        "/v1/reviews",
        Some(&alice),
        Some(review),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app.router, Method::DELETE, "/v1/reviews/2", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/v1/reviews",
        Some(&alice),
        Some(json!({ "product_id": 77, "rating": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.store.product_rating(1).await, Some(4.0));
}
