pub mod money;
pub mod order;
pub mod review;
