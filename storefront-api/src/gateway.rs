use async_trait::async_trait;
use std::sync::Arc;
use storefront_order::grpc::{order_from_proto, placed_from_proto, request_to_proto};
use storefront_order::proto::{order_service_client::OrderServiceClient, UserIdOrder};
use storefront_order::{OrderError, OrderService};
use storefront_shared::{Order, OrderRequest, PlacedOrder};
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

/// How the HTTP API reaches the order pricing engine
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn put_order(&self, request: OrderRequest) -> Result<PlacedOrder, GatewayError>;

    async fn get_all_orders(&self, user_id: i64) -> Result<Vec<Order>, GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The order can never be placed as submitted
    #[error("{0}")]
    Rejected(String),

    #[error("order service failed: {0}")]
    Failed(String),
}

impl From<OrderError> for GatewayError {
    fn from(err: OrderError) -> Self {
        if err.is_invalid_request() || matches!(err, OrderError::CostOverflow) {
            GatewayError::Rejected(err.to_string())
        } else {
            GatewayError::Failed(format!("{}: {}", err, source_message(&err)))
        }
    }
}

impl From<Status> for GatewayError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::InvalidArgument | Code::OutOfRange => {
                GatewayError::Rejected(status.message().to_string())
            }
            code => GatewayError::Failed(format!("{:?}: {}", code, status.message())),
        }
    }
}

fn source_message(err: &OrderError) -> String {
    std::error::Error::source(err)
        .map(|source| source.to_string())
        .unwrap_or_default()
}

/// Runs the pricing engine in the API process
pub struct LocalOrderGateway {
    service: Arc<OrderService>,
}

impl LocalOrderGateway {
    pub fn new(service: Arc<OrderService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl OrderGateway for LocalOrderGateway {
    async fn put_order(&self, request: OrderRequest) -> Result<PlacedOrder, GatewayError> {
        Ok(self.service.place_order(request).await?)
    }

    async fn get_all_orders(&self, user_id: i64) -> Result<Vec<Order>, GatewayError> {
        Ok(self.service.list_orders(user_id).await?)
    }
}

/// Calls a remote order service over gRPC
pub struct GrpcOrderGateway {
    client: OrderServiceClient<Channel>,
}

impl GrpcOrderGateway {
    /// The connection is opened on first use, so the API can start before
    /// the order service.
    pub fn connect_lazy(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(endpoint.to_string())?.connect_lazy();
        Ok(Self {
            client: OrderServiceClient::new(channel),
        })
    }
}

#[async_trait]
impl OrderGateway for GrpcOrderGateway {
    async fn put_order(&self, request: OrderRequest) -> Result<PlacedOrder, GatewayError> {
        let mut client = self.client.clone();
        let response = client.put_order(request_to_proto(&request)).await?;
        Ok(placed_from_proto(response.into_inner())?)
    }

    async fn get_all_orders(&self, user_id: i64) -> Result<Vec<Order>, GatewayError> {
        let mut client = self.client.clone();
        let response = client.get_all_orders(UserIdOrder { user_id }).await?;
        response
            .into_inner()
            .orders
            .into_iter()
            .map(|order| order_from_proto(order).map_err(GatewayError::from))
            .collect()
    }
}
