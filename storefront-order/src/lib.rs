pub mod grpc;
pub mod manager;

pub mod proto {
    tonic::include_proto!("order");
}

pub use grpc::OrderServiceImpl;
pub use manager::{OrderError, OrderService};
