use serde::{Deserialize, Serialize};

/// Itemized client-side reward preview for one bridge action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub amount: f64,
    pub base_rewards: f64,
    pub auto_deploy_bonus: f64,
    pub referral_bonus: f64,
    pub multiplier: f64,
    /// `(base + auto_deploy + referral) * multiplier`.
    pub total_rewards: f64,
}

impl RewardBreakdown {
    /// Sum of the components without the tier multiplier, as the bridge form
    /// preview shows it. The on-chain engine remains authoritative.
    pub fn unmultiplied_total(&self) -> f64 {
        self.base_rewards + self.auto_deploy_bonus + self.referral_bonus
    }

    pub fn effective_rate_pct(&self) -> f64 {
        if self.amount == 0.0 {
            return 0.0;
        }
        self.total_rewards / self.amount * 100.0
    }
}
