use serde::{Deserialize, Serialize};

/// What order placement does when a referenced product has no price record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPricePolicy {
    /// Fail the whole order without writing anything.
    #[default]
    Reject,
    /// Count the product as free and log a warning.
    PriceAtZero,
}
