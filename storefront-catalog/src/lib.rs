pub mod rating;
pub mod review;

pub use rating::{RatingTotals, MAX_RATING, MIN_RATING};
pub use review::{ReviewError, ReviewService};
