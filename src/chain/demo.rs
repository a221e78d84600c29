use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use rand::Rng;
use std::sync::Arc;
use crate::error::ScanError;
use crate::services::RewardCalculator;
use super::{
    address, ChainReader, ChainWriter, GlobalStats, RegisterBridge, TxStatus, TxStatusSource, UserPosition,
};

/// In-memory chain for demo mode: registrations land immediately in the
/// position table and confirm after a fixed number of status polls.
pub struct DemoChain {
    sender: String,
    calculator: Arc<RewardCalculator>,
    positions: DashMap<String, UserPosition>,
    stats: RwLock<GlobalStats>,
    /// digest -> polls left before it reports success
    pending: DashMap<String, u32>,
    confirmed: DashSet<String>,
    confirm_after: u32,
}

impl DemoChain {
    pub fn new(sender: &str, calculator: Arc<RewardCalculator>) -> Result<Self, ScanError> {
        if !address::is_valid_sui_address(sender) {
            return Err(ScanError::InvalidAddress(sender.to_string()));
        }
        Ok(Self {
            sender: address::normalize(sender),
            calculator,
            positions: DashMap::new(),
            stats: RwLock::new(GlobalStats::default()),
            pending: DashMap::new(),
            confirmed: DashSet::new(),
            confirm_after: 1,
        })
    }

    pub fn with_confirm_after(mut self, polls: u32) -> Self {
        self.confirm_after = polls;
        self
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    fn random_digest() -> String {
        let bytes: [u8; 32] = rand::thread_rng().gen();
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        format!("0x{}", hex)
    }

    fn track(&self) -> String {
        let digest = Self::random_digest();
        self.pending.insert(digest.clone(), self.confirm_after);
        digest
    }
}

#[async_trait]
impl ChainReader for DemoChain {
    async fn user_position(&self, user: &str) -> Result<Option<UserPosition>, ScanError> {
        if !address::is_valid_sui_address(user) {
            return Err(ScanError::InvalidAddress(user.to_string()));
        }
        Ok(self.positions.get(&address::normalize(user)).map(|p| p.clone()))
    }

    async fn global_stats(&self) -> Result<GlobalStats, ScanError> {
        Ok(self.stats.read().clone())
    }
}

#[async_trait]
impl ChainWriter for DemoChain {
    async fn submit_register_bridge(&self, payload: RegisterBridge) -> Result<String, ScanError> {
        let amount = payload.amount();
        let rewards = self
            .calculator
            .calculate_rewards(amount, payload.auto_deploy, payload.referrer.is_some())
            .map_err(|e| ScanError::ChainWriteFailed(e.to_string()))?;

        let mut is_new = false;
        {
            let mut entry = self.positions.entry(self.sender.clone()).or_insert_with(|| {
                is_new = true;
                UserPosition {
                    total_bridged: 0.0,
                    reward_multiplier: 1.0,
                    unclaimed_rewards: 0.0,
                    total_earned: 0.0,
                    auto_deployed: false,
                    target_protocol: String::new(),
                }
            });
            let position = entry.value_mut();
            position.total_bridged += amount;
            position.reward_multiplier = self.calculator.multiplier_for_amount(position.total_bridged);
            position.unclaimed_rewards += rewards.total_rewards;
            position.total_earned += rewards.total_rewards;
            position.auto_deployed = payload.auto_deploy;
            position.target_protocol = payload.target_protocol.clone();
        }

        {
            let mut stats = self.stats.write();
            stats.total_bridged += amount;
            stats.total_rewards_distributed += rewards.total_rewards;
            if is_new {
                stats.total_users += 1;
            }
        }

        let digest = self.track();
        tracing::info!(
            "🎭 Demo bridge registered: ${:.2} -> {} ({:.2} LQX) [{}]",
            amount, payload.target_protocol, rewards.total_rewards, digest
        );
        Ok(digest)
    }

    async fn submit_claim_rewards(&self) -> Result<String, ScanError> {
        let claimed = {
            let mut position = self
                .positions
                .get_mut(&self.sender)
                .ok_or_else(|| ScanError::ChainWriteFailed(format!("{} has no position to claim", self.sender)))?;
            std::mem::take(&mut position.unclaimed_rewards)
        };

        let digest = self.track();
        tracing::info!("🎭 Demo claim: {:.2} LQX [{}]", claimed, digest);
        Ok(digest)
    }
}

#[async_trait]
impl TxStatusSource for DemoChain {
    async fn transaction_status(&self, digest: &str) -> Result<TxStatus, ScanError> {
        if self.confirmed.contains(digest) {
            return Ok(TxStatus::Success);
        }

        let done = {
            let mut remaining = self
                .pending
                .get_mut(digest)
                .ok_or_else(|| ScanError::ChainReadFailed(format!("unknown transaction {}", digest)))?;
            *remaining = remaining.saturating_sub(1);
            *remaining == 0
        };

        if !done {
            return Ok(TxStatus::Pending);
        }
        self.pending.remove(digest);
        self.confirmed.insert(digest.to_string());
        Ok(TxStatus::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{wait_for_confirmation, Confirmation, PollConfig};
    use std::time::Duration;

    fn user() -> String {
        format!("0x{}", "7".repeat(64))
    }

    fn chain() -> DemoChain {
        DemoChain::new(&user(), Arc::new(RewardCalculator::default())).unwrap()
    }

    #[tokio::test]
    async fn registration_updates_position_and_stats() {
        let chain = chain();
        assert_eq!(chain.user_position(&user()).await.unwrap(), None);

        let payload = RegisterBridge::new(5000.0, "0xabcd", true, "Cetus USDC-SUI Pool", None).unwrap();
        chain.submit_register_bridge(payload).await.unwrap();
        let payload = RegisterBridge::new(6000.0, "0xabce", false, "Scallop Lending", None).unwrap();
        chain.submit_register_bridge(payload).await.unwrap();

        let position = chain.user_position(&user()).await.unwrap().unwrap();
        assert_eq!(position.total_bridged, 11_000.0);
        assert_eq!(position.reward_multiplier, 2.0);
        assert_eq!(position.target_protocol, "Scallop Lending");
        assert!(!position.auto_deployed);

        let stats = chain.global_stats().await.unwrap();
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_bridged, 11_000.0);
        assert!((stats.total_rewards_distributed - position.total_earned).abs() < 1e-9);
    }

    #[tokio::test]
    async fn registration_confirms_after_polls() {
        let chain = chain().with_confirm_after(3);
        let payload = RegisterBridge::new(100.0, "0x01", false, "Turbos Finance", None).unwrap();
        let digest = chain.submit_register_bridge(payload).await.unwrap();
        assert_eq!(digest.len(), 66);

        let poll = PollConfig { max_attempts: 2, delay: Duration::from_millis(1) };
        assert_eq!(wait_for_confirmation(&chain, &digest, poll).await.unwrap(), Confirmation::TimedOut);
        assert_eq!(wait_for_confirmation(&chain, &digest, poll).await.unwrap(), Confirmation::Confirmed);
    }

    #[tokio::test]
    async fn confirmed_digest_leaves_pending_table() {
        let chain = chain();
        let payload = RegisterBridge::new(100.0, "0x01", false, "Turbos Finance", None).unwrap();
        let digest = chain.submit_register_bridge(payload).await.unwrap();
        assert_eq!(chain.pending.len(), 1);

        assert_eq!(chain.transaction_status(&digest).await.unwrap(), TxStatus::Success);
        assert!(chain.pending.is_empty());
        assert_eq!(chain.transaction_status(&digest).await.unwrap(), TxStatus::Success);
    }

    #[tokio::test]
    async fn claim_resets_unclaimed_but_keeps_total_earned() {
        let chain = chain();
        let payload = RegisterBridge::new(5000.0, "0xabcd", false, "Cetus USDC-SUI Pool", None).unwrap();
        chain.submit_register_bridge(payload).await.unwrap();
        let before = chain.user_position(&user()).await.unwrap().unwrap();
        assert_eq!(before.unclaimed_rewards, 56.25);

        let digest = chain.submit_claim_rewards().await.unwrap();
        assert_eq!(chain.transaction_status(&digest).await.unwrap(), TxStatus::Success);

        let after = chain.user_position(&user()).await.unwrap().unwrap();
        assert_eq!(after.unclaimed_rewards, 0.0);
        assert_eq!(after.total_earned, 56.25);
        assert_eq!(after.total_bridged, 5000.0);
    }

    #[tokio::test]
    async fn claim_without_position_fails() {
        let err = chain().submit_claim_rewards().await.unwrap_err();
        assert!(matches!(err, ScanError::ChainWriteFailed(_)));
    }

    #[tokio::test]
    async fn unknown_digest_is_a_read_failure() {
        let err = chain().transaction_status("0xnope").await.unwrap_err();
        assert!(matches!(err, ScanError::ChainReadFailed(_)));
    }
}
