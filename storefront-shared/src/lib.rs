pub mod models;

pub use models::money::{Money, MoneyError};
pub use models::order::{
    Address, Order, OrderDraft, OrderLineItem, OrderRequest, OrderStatus, PlacedOrder,
    ProductPrice, UnknownStatus,
};
pub use models::review::{RatingBucket, RatingDistribution, RatingUpdate, Review};
