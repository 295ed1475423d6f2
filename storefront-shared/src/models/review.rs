use serde::{Deserialize, Serialize};

/// A user's review of a product. At most one exists per (user, product).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub user_id: i64,
    pub user_name: String,
    pub product_id: i64,
    pub rating: i32,
    pub content: String,
}

/// Number of reviews holding one rating value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBucket {
    pub rating: i32,
    pub count: i64,
}

/// Per-product rating histogram, the sufficient statistic for the aggregate.
///
/// `version` is bumped by every review write on the product; writes carry
/// the version they were computed from so the store can refuse stale ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDistribution {
    pub product_id: i64,
    pub buckets: Vec<RatingBucket>,
    pub version: i64,
}

/// New aggregate rating to persist together with a review change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub product_id: i64,
    pub rating: f64,
    pub expected_version: i64,
}
