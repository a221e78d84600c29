use serde::{Deserialize, Serialize};
use crate::config::RewardsConfig;
use crate::error::{validate_amount, ScanError};
use crate::models::RewardBreakdown;

/// 0.75% of the bridged amount, paid in LQX.
pub const BASE_REWARD_RATE: f64 = 0.0075;
/// Fraction of base rewards added when funds are auto-deployed.
pub const AUTO_DEPLOY_BONUS_RATE: f64 = 0.30;
/// Fraction of base rewards added when a referral code is used.
pub const REFERRAL_BONUS_RATE: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierTier {
    /// Inclusive lower bound of the tier.
    pub min: f64,
    pub multiplier: f64,
}

impl MultiplierTier {
    pub fn defaults() -> Vec<MultiplierTier> {
        vec![
            MultiplierTier { min: 0.0, multiplier: 1.0 },
            MultiplierTier { min: 1_000.0, multiplier: 1.5 },
            MultiplierTier { min: 10_000.0, multiplier: 2.0 },
            MultiplierTier { min: 50_000.0, multiplier: 3.0 },
        ]
    }
}

#[derive(Debug, Clone)]
pub struct RewardCalculator {
    base_rate: f64,
    auto_deploy_rate: f64,
    referral_rate: f64,
    /// Sorted ascending by `min`.
    tiers: Vec<MultiplierTier>,
}

impl Default for RewardCalculator {
    fn default() -> Self {
        Self::new(&RewardsConfig::default())
    }
}

impl RewardCalculator {
    pub fn new(config: &RewardsConfig) -> Self {
        let mut tiers = config.tiers.clone();
        tiers.sort_by(|a, b| a.min.total_cmp(&b.min));
        Self {
            base_rate: config.base_rate,
            auto_deploy_rate: config.auto_deploy_bonus,
            referral_rate: config.referral_bonus,
            tiers,
        }
    }

    pub fn tiers(&self) -> &[MultiplierTier] {
        &self.tiers
    }

    /// Highest tier whose lower bound the amount reaches; 1.0 below all tiers.
    pub fn multiplier_for_amount(&self, amount: f64) -> f64 {
        self.tiers
            .iter()
            .rev()
            .find(|tier| amount >= tier.min)
            .map(|tier| tier.multiplier)
            .unwrap_or(1.0)
    }

    pub fn calculate_rewards(
        &self,
        amount: f64,
        auto_deploy: bool,
        has_referral: bool,
    ) -> Result<RewardBreakdown, ScanError> {
        let amount = validate_amount(amount)?;

        let base_rewards = amount * self.base_rate;
        let auto_deploy_bonus = if auto_deploy { base_rewards * self.auto_deploy_rate } else { 0.0 };
        let referral_bonus = if has_referral { base_rewards * self.referral_rate } else { 0.0 };
        let multiplier = self.multiplier_for_amount(amount);

        Ok(RewardBreakdown {
            amount,
            base_rewards,
            auto_deploy_bonus,
            referral_bonus,
            multiplier,
            total_rewards: (base_rewards + auto_deploy_bonus + referral_bonus) * multiplier,
        })
    }
}
