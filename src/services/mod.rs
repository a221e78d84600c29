pub mod rewards;
pub mod scanner;

pub use rewards::{MultiplierTier, RewardCalculator};
pub use scanner::{compute_bridge_bonus, compute_earnings, OpportunityScanner};
