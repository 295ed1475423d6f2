use chrono::{DateTime, Utc};
use std::sync::Arc;
use storefront_shared::{
    Address, Money, Order, OrderLineItem, OrderRequest, OrderStatus, PlacedOrder,
};
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::manager::{OrderError, OrderService};
use crate::proto;
use crate::proto::order_service_server::OrderService as OrderServiceRpc;

/// gRPC front of [`OrderService`]
pub struct OrderServiceImpl {
    service: Arc<OrderService>,
}

impl OrderServiceImpl {
    pub fn new(service: Arc<OrderService>) -> Self {
        Self { service }
    }

    pub fn into_server(self) -> proto::order_service_server::OrderServiceServer<Self> {
        proto::order_service_server::OrderServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl OrderServiceRpc for OrderServiceImpl {
    async fn put_order(
        &self,
        request: Request<proto::Order>,
    ) -> Result<Response<proto::OrderCost>, Status> {
        let order = request_from_proto(request.into_inner())?;
        debug!(user_id = order.user_id, items = order.items.len(), "PutOrder");

        let placed = self.service.place_order(order).await.map_err(to_status)?;

        Ok(Response::new(proto::OrderCost {
            order_id: placed.order_id,
            cost: placed.cost.to_major() as f32,
            cost_minor: Some(placed.cost.minor()),
        }))
    }

    async fn get_all_orders(
        &self,
        request: Request<proto::UserIdOrder>,
    ) -> Result<Response<proto::ArrayOrders>, Status> {
        let user_id = request.into_inner().user_id;
        let orders = self.service.list_orders(user_id).await.map_err(to_status)?;

        Ok(Response::new(proto::ArrayOrders {
            orders: orders.iter().map(order_to_proto).collect(),
        }))
    }
}

pub fn to_status(err: OrderError) -> Status {
    match err {
        OrderError::CostOverflow => Status::out_of_range(err.to_string()),
        OrderError::Lookup(_) | OrderError::Persist(_) => Status::internal(err.to_string()),
        _ => Status::invalid_argument(err.to_string()),
    }
}

fn address_from_proto(address: Option<proto::Address>) -> Address {
    let address = address.unwrap_or_default();
    Address {
        country: address.country,
        region: address.region,
        city: address.city,
        street: address.street,
        house: address.house,
        flat: address.flat,
        index: address.index,
    }
}

fn address_to_proto(address: &Address) -> proto::Address {
    proto::Address {
        country: address.country.clone(),
        region: address.region.clone(),
        city: address.city.clone(),
        street: address.street.clone(),
        house: address.house.clone(),
        flat: address.flat.clone(),
        index: address.index.clone(),
    }
}

/// Read a submitted order. `Cost`, `Date` and `status` on the wire are
/// ignored; the service decides them.
pub fn request_from_proto(order: proto::Order) -> Result<OrderRequest, Status> {
    let items = order
        .products
        .into_iter()
        .map(|p| {
            let quantity = i32::try_from(p.number).map_err(|_| {
                Status::invalid_argument(format!("quantity {} is out of range", p.number))
            })?;
            Ok(OrderLineItem {
                product_id: p.product_id,
                quantity,
            })
        })
        .collect::<Result<Vec<_>, Status>>()?;

    Ok(OrderRequest {
        user_id: order.user_id,
        address: address_from_proto(order.address),
        items,
    })
}

pub fn request_to_proto(request: &OrderRequest) -> proto::Order {
    proto::Order {
        user_id: request.user_id,
        address: Some(address_to_proto(&request.address)),
        products: request
            .items
            .iter()
            .map(|item| proto::OrderProducts {
                order_id: 0,
                product_id: item.product_id,
                number: i64::from(item.quantity),
            })
            .collect(),
        ..Default::default()
    }
}

pub fn order_to_proto(order: &Order) -> proto::Order {
    proto::Order {
        order_id: order.id,
        user_id: order.user_id,
        date: order.created_at.to_rfc3339(),
        address: Some(address_to_proto(&order.address)),
        cost: order.cost.to_major() as f32,
        cost_minor: Some(order.cost.minor()),
        status: order.status.to_string(),
        products: order
            .items
            .iter()
            .map(|item| proto::OrderProducts {
                order_id: order.id,
                product_id: item.product_id,
                number: i64::from(item.quantity),
            })
            .collect(),
    }
}

/// Read a stored order returned by `GetAllOrders`
pub fn order_from_proto(order: proto::Order) -> Result<Order, Status> {
    let created_at = DateTime::parse_from_rfc3339(&order.date)
        .map_err(|e| Status::data_loss(format!("bad order date '{}': {}", order.date, e)))?
        .with_timezone(&Utc);
    let status = order
        .status
        .parse::<OrderStatus>()
        .map_err(|e| Status::data_loss(e.to_string()))?;
    let cost = wire_cost(order.cost_minor, order.cost)?;
    let id = order.order_id;
    let user_id = order.user_id;
    let address = address_from_proto(order.address);
    let request = request_from_proto(proto::Order {
        products: order.products,
        ..Default::default()
    })?;

    Ok(Order {
        id,
        user_id,
        created_at,
        address,
        cost,
        status,
        items: request.items,
    })
}

pub fn placed_from_proto(cost: proto::OrderCost) -> Result<PlacedOrder, Status> {
    Ok(PlacedOrder {
        order_id: cost.order_id,
        cost: wire_cost(cost.cost_minor, cost.cost)?,
    })
}

// `float` loses cents above 2^24 minor units, so the float is only read from
// peers that do not send `CostMinor`.
fn wire_cost(cost_minor: Option<i64>, cost: f32) -> Result<Money, Status> {
    match cost_minor {
        Some(minor) => Ok(Money::from_minor(minor)),
        None => Money::from_major(f64::from(cost)).map_err(|e| Status::data_loss(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::MissingPricePolicy;
    use storefront_store::MemoryStore;
    use tonic::Code;

    fn wire_order(products: &[(i64, i64)]) -> proto::Order {
        proto::Order {
            user_id: 3,
            address: Some(proto::Address {
                country: "Russia".into(),
                region: "Moscow".into(),
                city: "Moscow".into(),
                street: "Arbat".into(),
                house: "5".into(),
                flat: "1".into(),
                index: "119002".into(),
            }),
            // A client-supplied cost must not be trusted
            cost: 0.01,
            products: products
                .iter()
                .map(|&(product_id, number)| proto::OrderProducts {
                    order_id: 0,
                    product_id,
                    number,
                })
                .collect(),
            ..Default::default()
        }
    }

    async fn server() -> OrderServiceImpl {
        let store = Arc::new(MemoryStore::new());
        store.add_product(1, 250).await;
        store.add_product(2, 1999).await;
        let service = OrderService::new(store, MissingPricePolicy::Reject);
        OrderServiceImpl::new(Arc::new(service))
    }

    #[tokio::test]
    async fn test_put_order_computes_cost() {
        let server = server().await;

        let response = server
            .put_order(Request::new(wire_order(&[(1, 4), (2, 1)])))
            .await
            .unwrap()
            .into_inner();

        assert!(response.order_id > 0);
        let placed = placed_from_proto(response).unwrap();
        assert_eq!(placed.cost, Money::from_minor(2999));
    }

    #[tokio::test]
    async fn test_get_all_orders_returns_placed_orders() {
        let server = server().await;
        server
            .put_order(Request::new(wire_order(&[(1, 2)])))
            .await
            .unwrap();

        let orders = server
            .get_all_orders(Request::new(proto::UserIdOrder { user_id: 3 }))
            .await
            .unwrap()
            .into_inner()
            .orders;

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, "new");
        assert_eq!(orders[0].products[0].order_id, orders[0].order_id);
        assert_eq!(orders[0].products[0].number, 2);

        let order = order_from_proto(orders[0].clone()).unwrap();
        assert_eq!(order.cost, Money::from_minor(500));
        assert_eq!(order.address.street, "Arbat");
    }

    #[tokio::test]
    async fn test_status_codes() {
        let server = server().await;

        let err = server
            .put_order(Request::new(wire_order(&[])))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let err = server
            .put_order(Request::new(wire_order(&[(42, 1)])))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let err = server
            .put_order(Request::new(wire_order(&[(1, i64::from(i32::MAX) + 1)])))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let mut no_address = wire_order(&[(1, 1)]);
        no_address.address = None;
        let err = server.put_order(Request::new(no_address)).await.unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        assert_eq!(to_status(OrderError::CostOverflow).code(), Code::OutOfRange);
        assert_eq!(
            to_status(OrderError::Persist("gone".into())).code(),
            Code::Internal
        );
    }

    #[tokio::test]
    async fn test_large_cost_stays_exact() {
        let store = Arc::new(MemoryStore::new());
        store.add_product(1, 123_456_789).await;
        let service = OrderService::new(store, MissingPricePolicy::Reject);
        let server = OrderServiceImpl::new(Arc::new(service));

        let response = server
            .put_order(Request::new(wire_order(&[(1, 1)])))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(response.cost_minor, Some(123_456_789));
        let placed = placed_from_proto(response).unwrap();
        assert_eq!(placed.cost, Money::from_minor(123_456_789));

        let orders = server
            .get_all_orders(Request::new(proto::UserIdOrder { user_id: 3 }))
            .await
            .unwrap()
            .into_inner()
            .orders;
        let order = order_from_proto(orders[0].clone()).unwrap();
        assert_eq!(order.cost, Money::from_minor(123_456_789));
    }

    #[test]
    fn test_cost_falls_back_to_float_without_minor_units() {
        let placed = placed_from_proto(proto::OrderCost {
            order_id: 9,
            cost: 12.5,
            cost_minor: None,
        })
        .unwrap();
        assert_eq!(placed.cost, Money::from_minor(1250));
    }

    #[test]
    fn test_request_round_trip_keeps_items() {
        let request = request_from_proto(wire_order(&[(1, 2), (2, 5)])).unwrap();
        let wire = request_to_proto(&request);
        assert_eq!(request_from_proto(wire).unwrap(), request);
    }
}
