use std::sync::Arc;
use storefront_catalog::ReviewService;

use crate::gateway::OrderGateway;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub reviews: Arc<ReviewService>,
    pub orders: Arc<dyn OrderGateway>,
    pub auth: AuthConfig,
}
