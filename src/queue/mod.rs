//! Holding-queue ordering and roster/waitlist promotion.

mod orderer;
mod promotion;

pub use orderer::{fixed_queue, randomize_holding, randomize_moves, FixedOrder};
pub use promotion::PromotionAssigner;
