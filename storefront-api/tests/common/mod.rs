#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use std::sync::Arc;
use storefront_api::gateway::LocalOrderGateway;
use storefront_api::middleware::UserClaims;
use storefront_api::{app, AppState, AuthConfig};
use storefront_catalog::ReviewService;
use storefront_core::MissingPricePolicy;
use storefront_order::OrderService;
use storefront_store::MemoryStore;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

/// Router over an in-memory store holding product 1 at 10.50 and
/// product 2 at 3.99
pub async fn setup() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    store.add_product(1, 1050).await;
    store.add_product(2, 399).await;

    let orders = OrderService::new(store.clone(), MissingPricePolicy::Reject);
    let state = AppState {
        reviews: Arc::new(ReviewService::new(store.clone())),
        orders: Arc::new(LocalOrderGateway::new(Arc::new(orders))),
        auth: AuthConfig {
            secret: SECRET.to_string(),
        },
    };

    TestApp {
        router: app(state),
        store,
    }
}

pub fn token(user_id: i64, name: &str) -> String {
    let claims = UserClaims {
        sub: user_id,
        name: name.to_string(),
        exp: 4_102_444_800, // 2100-01-01
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
