use storefront_shared::RatingDistribution;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

pub fn is_valid_rating(rating: i32) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// Sum and count of all ratings on a product, folded from its distribution.
///
/// Recomputing from buckets costs O(distinct rating values) regardless of how
/// many reviews the product has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RatingTotals {
    pub total: i64,
    pub count: i64,
}

impl RatingTotals {
    pub fn from_distribution(distribution: &RatingDistribution) -> Self {
        distribution
            .buckets
            .iter()
            .fold(Self::default(), |acc, bucket| Self {
                total: acc.total + i64::from(bucket.rating) * bucket.count,
                count: acc.count + bucket.count,
            })
    }

    /// Aggregate once `rating` is added as a new review
    pub fn after_add(&self, rating: i32) -> f64 {
        average(self.total + i64::from(rating), self.count + 1)
    }

    /// Aggregate once an existing review changes from `old` to `new`.
    /// The review count is unchanged.
    pub fn after_update(&self, old: i32, new: i32) -> f64 {
        average(self.total - i64::from(old) + i64::from(new), self.count)
    }

    /// Aggregate once the review holding `old` is removed.
    /// Removing the last review resets the aggregate to zero.
    pub fn after_delete(&self, old: i32) -> f64 {
        if self.count > 1 {
            average(self.total - i64::from(old), self.count - 1)
        } else {
            0.0
        }
    }
}

fn average(total: i64, count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    round_rating(total as f64 / count as f64)
}

/// Aggregates are kept to two decimal places, half away from zero.
pub fn round_rating(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_shared::RatingBucket;

    fn distribution(buckets: &[(i32, i64)]) -> RatingDistribution {
        RatingDistribution {
            product_id: 1,
            buckets: buckets
                .iter()
                .map(|&(rating, count)| RatingBucket { rating, count })
                .collect(),
            version: 0,
        }
    }

    #[test]
    fn test_totals_from_buckets() {
        let totals = RatingTotals::from_distribution(&distribution(&[(5, 3), (4, 2), (1, 1)]));
        assert_eq!(totals, RatingTotals { total: 24, count: 6 });
    }

    #[test]
    fn test_add_to_empty_product() {
        let totals = RatingTotals::from_distribution(&distribution(&[]));
        assert_eq!(totals.after_add(5), 5.0);
    }

    #[test]
    fn test_add_is_weighted() {
        // 5, 5, 3 + 4 => 17 / 4
        let totals = RatingTotals::from_distribution(&distribution(&[(5, 2), (3, 1)]));
        assert_eq!(totals.after_add(4), 4.25);
    }

    #[test]
    fn test_update_keeps_count() {
        let totals = RatingTotals::from_distribution(&distribution(&[(2, 1)]));
        assert_eq!(totals.after_update(2, 4), 4.0);
    }

    #[test]
    fn test_update_with_zero_count_is_zero() {
        assert_eq!(RatingTotals::default().after_update(2, 4), 0.0);
    }

    #[test]
    fn test_delete_last_review_resets() {
        let totals = RatingTotals::from_distribution(&distribution(&[(4, 1)]));
        assert_eq!(totals.after_delete(4), 0.0);
    }

    #[test]
    fn test_delete_one_of_two() {
        let totals = RatingTotals::from_distribution(&distribution(&[(3, 1), (5, 1)]));
        assert_eq!(totals.after_delete(3), 5.0);
    }

    #[test]
    fn test_rounding() {
        // 1 + 1 + 2 => 1.333...
        let totals = RatingTotals::from_distribution(&distribution(&[(1, 2)]));
        assert_eq!(totals.after_add(2), 1.33);
        // 5 + 5 + 4 => 4.666...
        let totals = RatingTotals::from_distribution(&distribution(&[(5, 2)]));
        assert_eq!(totals.after_add(4), 4.67);
    }

    #[test]
    fn test_rating_bounds() {
        assert!(is_valid_rating(1));
        assert!(is_valid_rating(5));
        assert!(!is_valid_rating(0));
        assert!(!is_valid_rating(6));
    }
}
