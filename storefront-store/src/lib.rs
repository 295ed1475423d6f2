pub mod app_config;
pub mod database;
pub mod memory;
pub mod order_repo;
pub mod review_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use memory::MemoryStore;
pub use order_repo::PgOrderRepository;
pub use review_repo::PgReviewRepository;
