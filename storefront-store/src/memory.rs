use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::debug;

use storefront_core::{OrderRepository, ReviewRepository, StoreError, StoreFault};
use storefront_shared::{
    Money, Order, OrderDraft, ProductPrice, RatingBucket, RatingDistribution, RatingUpdate,
    Review,
};

struct ProductEntry {
    price: Money,
    rating: f64,
    rating_version: i64,
}

#[derive(Default)]
struct StoreData {
    products: HashMap<i64, ProductEntry>,
    reviews: BTreeMap<(i64, i64), Review>, // (product_id, user_id) -> review
    orders: BTreeMap<i64, Order>,
    next_order_id: i64,
}

impl StoreData {
    fn product_mut(&mut self, update: &RatingUpdate) -> Result<&mut ProductEntry, StoreError> {
        let product = self
            .products
            .get_mut(&update.product_id)
            .ok_or(StoreFault::UnknownProduct(update.product_id))?;

        if product.rating_version != update.expected_version {
            return Err(Box::new(StoreFault::ConcurrentUpdate(update.product_id)));
        }
        Ok(product)
    }
}

/// In-memory repository (useful for testing and local runs).
///
/// Every call runs under one lock, so each write, including its version
/// check, is atomic with respect to every other call.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product with its unit price in minor units
    pub async fn add_product(&self, product_id: i64, price_minor: i64) {
        let mut data = self.data.lock().await;
        data.products.insert(
            product_id,
            ProductEntry {
                price: Money::from_minor(price_minor),
                rating: 0.0,
                rating_version: 0,
            },
        );
    }

    /// Current aggregate rating of a product
    pub async fn product_rating(&self, product_id: i64) -> Option<f64> {
        let data = self.data.lock().await;
        data.products.get(&product_id).map(|p| p.rating)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn select_prices(&self, product_ids: &[i64]) -> Result<Vec<ProductPrice>, StoreError> {
        let data = self.data.lock().await;
        let mut seen = HashSet::new();
        Ok(product_ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| {
                data.products.get(id).map(|p| ProductPrice {
                    product_id: *id,
                    price: p.price,
                })
            })
            .collect())
    }

    async fn put_order(&self, order: &OrderDraft) -> Result<i64, StoreError> {
        let mut data = self.data.lock().await;
        data.next_order_id += 1;
        let id = data.next_order_id;
        data.orders.insert(id, order.clone().into_order(id));
        debug!("Stored order {} for user {}", id, order.user_id);
        Ok(id)
    }

    async fn get_all_orders(&self, user_id: i64) -> Result<Vec<Order>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn get_review_by_user_and_product(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> Result<Option<Review>, StoreError> {
        let data = self.data.lock().await;
        Ok(data.reviews.get(&(product_id, user_id)).cloned())
    }

    async fn get_all_ratings_of_product(
        &self,
        product_id: i64,
    ) -> Result<RatingDistribution, StoreError> {
        let data = self.data.lock().await;
        let product = data
            .products
            .get(&product_id)
            .ok_or(StoreFault::UnknownProduct(product_id))?;

        let mut counts: BTreeMap<i32, i64> = BTreeMap::new();
        let reviews = data
            .reviews
            .range((product_id, i64::MIN)..=(product_id, i64::MAX));
        for (_, review) in reviews {
            *counts.entry(review.rating).or_default() += 1;
        }

        Ok(RatingDistribution {
            product_id,
            buckets: counts
                .into_iter()
                .map(|(rating, count)| RatingBucket { rating, count })
                .collect(),
            version: product.rating_version,
        })
    }

    async fn add_review(&self, review: &Review, update: RatingUpdate) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let key = (review.product_id, review.user_id);
        if data.reviews.contains_key(&key) {
            return Err(Box::new(StoreFault::ConcurrentUpdate(review.product_id)));
        }

        let product = data.product_mut(&update)?;
        product.rating = update.rating;
        product.rating_version += 1;
        data.reviews.insert(key, review.clone());
        Ok(())
    }

    async fn update_review(&self, review: &Review, update: RatingUpdate) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let key = (review.product_id, review.user_id);
        if !data.reviews.contains_key(&key) {
            return Err(Box::new(StoreFault::ConcurrentUpdate(review.product_id)));
        }

        let product = data.product_mut(&update)?;
        product.rating = update.rating;
        product.rating_version += 1;
        data.reviews.insert(key, review.clone());
        Ok(())
    }

    async fn delete_review(
        &self,
        user_id: i64,
        product_id: i64,
        update: RatingUpdate,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        if !data.reviews.contains_key(&(product_id, user_id)) {
            return Err(Box::new(StoreFault::ConcurrentUpdate(product_id)));
        }

        let product = data.product_mut(&update)?;
        product.rating = update.rating;
        product.rating_version += 1;
        data.reviews.remove(&(product_id, user_id));
        Ok(())
    }

    async fn get_reviews_by_product_id(&self, product_id: i64) -> Result<Vec<Review>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .reviews
            .range((product_id, i64::MIN)..=(product_id, i64::MAX))
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn get_reviews_by_user(&self, user_name: &str) -> Result<Vec<Review>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .reviews
            .values()
            .filter(|r| r.user_name == user_name)
            .cloned()
            .collect())
    }
}
