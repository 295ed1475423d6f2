use std::sync::Arc;
use storefront_core::{ReviewRepository, StoreError, StoreFault};
use storefront_shared::{RatingDistribution, RatingUpdate, Review};
use tracing::{error, info};

use crate::rating::{is_valid_rating, RatingTotals, MAX_RATING, MIN_RATING};

/// Maintains the aggregate product rating as reviews are added, edited and
/// removed. Holds no state between calls.
pub struct ReviewService {
    repo: Arc<dyn ReviewRepository>,
}

impl ReviewService {
    pub fn new(repo: Arc<dyn ReviewRepository>) -> Self {
        Self { repo }
    }

    /// Add a new review and fold its rating into the product aggregate
    pub async fn add_review(&self, review: Review) -> Result<(), ReviewError> {
        check_rating(review.rating)?;

        let distribution = self.distribution(review.product_id).await?;
        if self.existing(review.user_id, review.product_id).await?.is_some() {
            return Err(ReviewError::ReviewExists {
                user_id: review.user_id,
                product_id: review.product_id,
            });
        }

        let rating = RatingTotals::from_distribution(&distribution).after_add(review.rating);
        let update = rating_update(&distribution, rating);

        self.repo
            .add_review(&review, update)
            .await
            .map_err(|e| write_error(review.product_id, e))?;

        info!(
            user_id = review.user_id,
            product_id = review.product_id,
            rating,
            "Review added"
        );
        Ok(())
    }

    /// Replace the rating and text of an existing review
    pub async fn update_review(&self, review: Review) -> Result<(), ReviewError> {
        check_rating(review.rating)?;

        let distribution = self.distribution(review.product_id).await?;
        let old = self
            .existing(review.user_id, review.product_id)
            .await?
            .ok_or(ReviewError::NoReview {
                user_id: review.user_id,
                product_id: review.product_id,
            })?;

        let rating = RatingTotals::from_distribution(&distribution)
            .after_update(old.rating, review.rating);
        let update = rating_update(&distribution, rating);

        self.repo
            .update_review(&review, update)
            .await
            .map_err(|e| write_error(review.product_id, e))?;

        info!(
            user_id = review.user_id,
            product_id = review.product_id,
            rating,
            "Review updated"
        );
        Ok(())
    }

    /// Remove a review and take its rating out of the product aggregate
    pub async fn delete_review(&self, user_id: i64, product_id: i64) -> Result<(), ReviewError> {
        let distribution = self.distribution(product_id).await?;
        let old = self
            .existing(user_id, product_id)
            .await?
            .ok_or(ReviewError::NoReview { user_id, product_id })?;

        let rating = RatingTotals::from_distribution(&distribution).after_delete(old.rating);
        let update = rating_update(&distribution, rating);

        self.repo
            .delete_review(user_id, product_id, update)
            .await
            .map_err(|e| write_error(product_id, e))?;

        info!(user_id, product_id, rating, "Review deleted");
        Ok(())
    }

    pub async fn get_reviews_by_product_id(
        &self,
        product_id: i64,
    ) -> Result<Vec<Review>, ReviewError> {
        self.repo
            .get_reviews_by_product_id(product_id)
            .await
            .map_err(ReviewError::Lookup)
    }

    pub async fn get_reviews_by_user(&self, user_name: &str) -> Result<Vec<Review>, ReviewError> {
        self.repo
            .get_reviews_by_user(user_name)
            .await
            .map_err(ReviewError::Lookup)
    }

    // Read before the review itself so the version check at write time
    // also covers the review lookup.
    async fn distribution(&self, product_id: i64) -> Result<RatingDistribution, ReviewError> {
        self.repo
            .get_all_ratings_of_product(product_id)
            .await
            .map_err(|e| read_error(product_id, e))
    }

    async fn existing(&self, user_id: i64, product_id: i64) -> Result<Option<Review>, ReviewError> {
        self.repo
            .get_review_by_user_and_product(user_id, product_id)
            .await
            .map_err(|e| read_error(product_id, e))
    }
}

fn check_rating(rating: i32) -> Result<(), ReviewError> {
    if is_valid_rating(rating) {
        Ok(())
    } else {
        Err(ReviewError::InvalidRating(rating))
    }
}

fn rating_update(distribution: &RatingDistribution, rating: f64) -> RatingUpdate {
    RatingUpdate {
        product_id: distribution.product_id,
        rating,
        expected_version: distribution.version,
    }
}

fn read_error(product_id: i64, err: StoreError) -> ReviewError {
    match StoreFault::find(&err) {
        Some(StoreFault::UnknownProduct(_)) => ReviewError::UnknownProduct(product_id),
        _ => {
            error!(product_id, error = %err, "Review lookup failed");
            ReviewError::Lookup(err)
        }
    }
}

fn write_error(product_id: i64, err: StoreError) -> ReviewError {
    match StoreFault::find(&err) {
        Some(StoreFault::ConcurrentUpdate(_)) => ReviewError::Conflict(product_id),
        Some(StoreFault::UnknownProduct(_)) => ReviewError::UnknownProduct(product_id),
        None => {
            error!(product_id, error = %err, "Review write failed");
            ReviewError::Persist(err)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("rating {0} is outside {min}..={max}", min = MIN_RATING, max = MAX_RATING)]
    InvalidRating(i32),

    #[error("user {user_id} has already reviewed product {product_id}")]
    ReviewExists { user_id: i64, product_id: i64 },

    #[error("user {user_id} has no review of product {product_id}")]
    NoReview { user_id: i64, product_id: i64 },

    #[error("product {0} does not exist")]
    UnknownProduct(i64),

    #[error("rating of product {0} changed concurrently, retry the request")]
    Conflict(i64),

    #[error("review lookup failed")]
    Lookup(#[source] StoreError),

    #[error("review write failed")]
    Persist(#[source] StoreError),
}
