use async_trait::async_trait;
use storefront_shared::{
    Order, OrderDraft, ProductPrice, RatingDistribution, RatingUpdate, Review,
};

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Store conditions the engines react to. Repositories return these boxed
/// inside `StoreError`; callers recover them with `StoreFault::find`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreFault {
    #[error("rating of product {0} was changed concurrently")]
    ConcurrentUpdate(i64),

    #[error("product {0} does not exist")]
    UnknownProduct(i64),
}

impl StoreFault {
    pub fn find(err: &StoreError) -> Option<&StoreFault> {
        err.downcast_ref::<StoreFault>()
    }
}

/// Repository trait for order placement and listing
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Current unit prices of the given products, in one batched read.
    /// Products without a price record are simply absent from the result.
    async fn select_prices(
        &self,
        product_ids: &[i64],
    ) -> Result<Vec<ProductPrice>, StoreError>;

    /// Persist header and line items atomically, returning the new order id.
    async fn put_order(
        &self,
        order: &OrderDraft,
    ) -> Result<i64, StoreError>;

    async fn get_all_orders(
        &self,
        user_id: i64,
    ) -> Result<Vec<Order>, StoreError>;
}

/// Repository trait for reviews and product rating aggregates.
///
/// Every write applies the review change and the new aggregate in one atomic
/// step, and only if the product's distribution version still equals
/// `update.expected_version`. Otherwise nothing is written and the call fails
/// with `StoreFault::ConcurrentUpdate`.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn get_review_by_user_and_product(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> Result<Option<Review>, StoreError>;

    /// Fails with `StoreFault::UnknownProduct` if the product does not exist.
    async fn get_all_ratings_of_product(
        &self,
        product_id: i64,
    ) -> Result<RatingDistribution, StoreError>;

    async fn add_review(
        &self,
        review: &Review,
        update: RatingUpdate,
    ) -> Result<(), StoreError>;

    async fn update_review(
        &self,
        review: &Review,
        update: RatingUpdate,
    ) -> Result<(), StoreError>;

    async fn delete_review(
        &self,
        user_id: i64,
        product_id: i64,
        update: RatingUpdate,
    ) -> Result<(), StoreError>;

    async fn get_reviews_by_product_id(
        &self,
        product_id: i64,
    ) -> Result<Vec<Review>, StoreError>;

    async fn get_reviews_by_user(
        &self,
        user_name: &str,
    ) -> Result<Vec<Review>, StoreError>;
}
