use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use storefront_core::{MissingPricePolicy, OrderRepository, StoreError};
use storefront_shared::{Money, Order, OrderDraft, OrderRequest, OrderStatus, PlacedOrder};
use tracing::{error, info, warn};

/// Prices and persists customer orders.
///
/// The cost is always computed here from current catalog prices; a cost
/// supplied by the caller is never trusted.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    policy: MissingPricePolicy,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, policy: MissingPricePolicy) -> Self {
        Self { repo, policy }
    }

    pub fn policy(&self) -> MissingPricePolicy {
        self.policy
    }

    /// Validate, price and store an order
    pub async fn place_order(&self, request: OrderRequest) -> Result<PlacedOrder, OrderError> {
        validate(&request)?;

        let prices = self.resolve_prices(&request).await?;
        let cost = self.total_cost(&request, &prices)?;

        let draft = OrderDraft {
            user_id: request.user_id,
            created_at: Utc::now(),
            address: request.address,
            cost,
            status: OrderStatus::New,
            items: request.items,
        };

        let order_id = self.repo.put_order(&draft).await.map_err(|e| {
            error!(user_id = draft.user_id, error = %e, "Failed to persist order");
            OrderError::Persist(e)
        })?;

        info!(order_id, user_id = draft.user_id, cost = %cost, "Order placed");
        Ok(PlacedOrder { order_id, cost })
    }

    /// Every order of a user, in the order the repository returns them
    pub async fn list_orders(&self, user_id: i64) -> Result<Vec<Order>, OrderError> {
        self.repo.get_all_orders(user_id).await.map_err(|e| {
            error!(user_id, error = %e, "Failed to load orders");
            OrderError::Lookup(e)
        })
    }

    async fn resolve_prices(
        &self,
        request: &OrderRequest,
    ) -> Result<HashMap<i64, Money>, OrderError> {
        let mut seen = HashSet::new();
        let product_ids: Vec<i64> = request
            .items
            .iter()
            .map(|item| item.product_id)
            .filter(|id| seen.insert(*id))
            .collect();

        let prices = self.repo.select_prices(&product_ids).await.map_err(|e| {
            error!(error = %e, "Failed to load product prices");
            OrderError::Lookup(e)
        })?;

        Ok(prices.into_iter().map(|p| (p.product_id, p.price)).collect())
    }

    fn total_cost(
        &self,
        request: &OrderRequest,
        prices: &HashMap<i64, Money>,
    ) -> Result<Money, OrderError> {
        let mut total = Money::ZERO;
        for item in &request.items {
            let price = match prices.get(&item.product_id) {
                Some(price) => *price,
                None => match self.policy {
                    MissingPricePolicy::Reject => {
                        return Err(OrderError::UnknownProduct(item.product_id));
                    }
                    MissingPricePolicy::PriceAtZero => {
                        warn!(
                            product_id = item.product_id,
                            user_id = request.user_id,
                            "Product has no price, counting it as free"
                        );
                        Money::ZERO
                    }
                },
            };

            total = price
                .checked_mul(i64::from(item.quantity))
                .and_then(|line| total.checked_add(line))
                .ok_or(OrderError::CostOverflow)?;
        }
        Ok(total)
    }
}

fn validate(request: &OrderRequest) -> Result<(), OrderError> {
    if request.items.is_empty() {
        return Err(OrderError::EmptyItems);
    }
    if let Some(item) = request.items.iter().find(|item| item.quantity <= 0) {
        return Err(OrderError::InvalidQuantity(item.quantity));
    }
    if let Some(field) = request.address.first_blank_field() {
        return Err(OrderError::MissingAddressField(field));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order has no items")]
    EmptyItems,

    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    #[error("address field '{0}' is required")]
    MissingAddressField(&'static str),

    #[error("product {0} has no price")]
    UnknownProduct(i64),

    #[error("order cost does not fit in the currency range")]
    CostOverflow,

    #[error("failed to load order data")]
    Lookup(#[source] StoreError),

    #[error("failed to store order")]
    Persist(#[source] StoreError),
}

impl OrderError {
    /// Whether the caller sent a request that can never succeed as is
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            OrderError::EmptyItems
                | OrderError::InvalidQuantity(_)
                | OrderError::MissingAddressField(_)
                | OrderError::UnknownProduct(_)
        )
    }
}
