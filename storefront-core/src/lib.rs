pub mod repository;
pub mod policy;

pub use policy::MissingPricePolicy;
pub use repository::{OrderRepository, ReviewRepository, StoreError, StoreFault};
