use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_shared::{Address, Order, OrderLineItem, OrderRequest, PlacedOrder};

use crate::error::AppError;
use crate::middleware::UserClaims;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// The customer is taken from the token; any cost sent by the client is
/// not part of the request.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub address: Address,
    pub items: Vec<OrderLineItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlacedOrderResponse {
    pub order_id: i64,
    /// Major units, exact ("32.97")
    pub cost: String,
    pub cost_minor: i64,
}

impl From<PlacedOrder> for PlacedOrderResponse {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            order_id: placed.order_id,
            cost: placed.cost.to_string(),
            cost_minor: placed.cost.minor(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub address: Address,
    pub cost: String,
    pub cost_minor: i64,
    pub status: String,
    pub items: Vec<OrderLineItem>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            created_at: order.created_at,
            address: order.address,
            cost: order.cost.to_string(),
            cost_minor: order.cost.minor(),
            status: order.status.to_string(),
            items: order.items,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/orders", post(place_order).get(list_orders))
}

/// POST /v1/orders
async fn place_order(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrderResponse>), AppError> {
    let request = OrderRequest {
        user_id: claims.sub,
        address: req.address,
        items: req.items,
    };

    let placed = state.orders.put_order(request).await?;
    Ok((StatusCode::CREATED, Json(placed.into())))
}

/// GET /v1/orders
async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = state.orders.get_all_orders(claims.sub).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
