pub mod alert;
pub mod protocol;
pub mod rewards;

pub use alert::{Earnings, OpportunityAlert, Scan};
pub use protocol::{seed_catalog, Category, Chain, Protocol, RiskLabel};
pub use rewards::RewardBreakdown;
