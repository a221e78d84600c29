pub mod address;
pub mod decode;
pub mod demo;
pub mod sui;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::config::ChainConfig;
use crate::error::{validate_amount, ScanError};

pub use demo::DemoChain;
pub use sui::SuiRpc;

/// USDC and LQX both use 6 decimals on chain.
pub const MICRO_UNITS: f64 = 1_000_000.0;
/// On-chain multipliers are stored in basis points.
pub const MULTIPLIER_BPS: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPosition {
    pub total_bridged: f64,
    pub reward_multiplier: f64,
    pub unclaimed_rewards: f64,
    pub total_earned: f64,
    pub auto_deployed: bool,
    pub target_protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_bridged: f64,
    pub total_rewards_distributed: f64,
    pub total_users: u64,
}

/// Prepared payload for the registry's `register_bridge` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterBridge {
    pub amount_micro: u64,
    pub source_tx_hash: Vec<u8>,
    pub auto_deploy: bool,
    pub target_protocol: String,
    pub referrer: Option<String>,
}

impl RegisterBridge {
    pub fn new(
        amount: f64,
        source_tx_hash: &str,
        auto_deploy: bool,
        target_protocol: &str,
        referrer: Option<&str>,
    ) -> Result<Self, ScanError> {
        let amount = validate_amount(amount)?;
        if amount == 0.0 {
            return Err(ScanError::InvalidAmount("cannot register a zero bridge".into()));
        }

        let referrer = match referrer {
            Some(addr) if !address::is_valid_sui_address(addr) => {
                return Err(ScanError::InvalidAddress(addr.to_string()))
            }
            Some(addr) => Some(address::normalize(addr)),
            None => None,
        };

        Ok(Self {
            amount_micro: (amount * MICRO_UNITS).floor() as u64,
            source_tx_hash: decode_hex(source_tx_hash)
                .ok_or_else(|| ScanError::InvalidTxHash(source_tx_hash.to_string()))?,
            auto_deploy,
            target_protocol: target_protocol.to_string(),
            referrer,
        })
    }

    pub fn amount(&self) -> f64 {
        self.amount_micro as f64 / MICRO_UNITS
    }
}

fn decode_hex(input: &str) -> Option<Vec<u8>> {
    let hex = input.strip_prefix("0x").unwrap_or(input);
    if hex.is_empty() || hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Success,
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "error", rename_all = "snake_case")]
pub enum Confirmation {
    Confirmed,
    Failed(String),
    TimedOut,
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `None` when the address has never bridged or the data does not decode.
    async fn user_position(&self, address: &str) -> Result<Option<UserPosition>, ScanError>;
    async fn global_stats(&self) -> Result<GlobalStats, ScanError>;
}

#[async_trait]
pub trait ChainWriter: Send + Sync {
    /// Returns the pending transaction digest.
    async fn submit_register_bridge(&self, payload: RegisterBridge) -> Result<String, ScanError>;
    /// Claims the sender's unclaimed rewards; returns the pending digest.
    async fn submit_claim_rewards(&self) -> Result<String, ScanError>;
}

#[async_trait]
pub trait TxStatusSource: Send + Sync {
    async fn transaction_status(&self, digest: &str) -> Result<TxStatus, ScanError>;
}

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl From<&ChainConfig> for PollConfig {
    fn from(config: &ChainConfig) -> Self {
        Self {
            max_attempts: config.poll_attempts,
            delay: Duration::from_millis(config.poll_delay_ms),
        }
    }
}

/// Polls until the transaction finalizes or attempts run out. Lookup errors
/// are retried; if no attempt succeeded the last error is returned as-is.
pub async fn wait_for_confirmation(
    source: &dyn TxStatusSource,
    digest: &str,
    poll: PollConfig,
) -> Result<Confirmation, ScanError> {
    let mut last_error = None;
    let mut answered = false;

    for attempt in 1..=poll.max_attempts {
        match source.transaction_status(digest).await {
            Ok(TxStatus::Success) => {
                tracing::info!("✅ {} confirmed after {} attempts", digest, attempt);
                return Ok(Confirmation::Confirmed);
            }
            Ok(TxStatus::Failure(reason)) => {
                tracing::error!("Transaction {} failed: {}", digest, reason);
                return Ok(Confirmation::Failed(reason));
            }
            Ok(TxStatus::Pending) => answered = true,
            Err(e) => {
                tracing::warn!("Status check {}/{} for {}: {}", attempt, poll.max_attempts, digest, e);
                last_error = Some(e);
            }
        }

        if attempt < poll.max_attempts {
            tokio::time::sleep(poll.delay).await;
        }
    }

    match last_error {
        Some(e) if !answered => Err(e),
        _ => Ok(Confirmation::TimedOut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Scripted(Mutex<Vec<Result<TxStatus, ScanError>>>);

    #[async_trait]
    impl TxStatusSource for Scripted {
        async fn transaction_status(&self, _digest: &str) -> Result<TxStatus, ScanError> {
            let mut script = self.0.lock();
            if script.is_empty() {
                Ok(TxStatus::Pending)
            } else {
                script.remove(0)
            }
        }
    }

    fn poll(max_attempts: u32) -> PollConfig {
        PollConfig { max_attempts, delay: Duration::from_millis(1) }
    }

    #[tokio::test]
    async fn confirms_after_pending_and_errors() {
        let source = Scripted(Mutex::new(vec![
            Ok(TxStatus::Pending),
            Err(ScanError::ChainReadFailed("502".into())),
            Ok(TxStatus::Success),
        ]));
        let outcome = wait_for_confirmation(&source, "0xabc", poll(5)).await.unwrap();
        assert_eq!(outcome, Confirmation::Confirmed);
    }

    #[tokio::test]
    async fn reports_failure_reason() {
        let source = Scripted(Mutex::new(vec![Ok(TxStatus::Failure("InsufficientGas".into()))]));
        let outcome = wait_for_confirmation(&source, "0xabc", poll(5)).await.unwrap();
        assert_eq!(outcome, Confirmation::Failed("InsufficientGas".into()));
    }

    #[tokio::test]
    async fn times_out_when_always_pending() {
        let source = Scripted(Mutex::new(vec![]));
        let outcome = wait_for_confirmation(&source, "0xabc", poll(3)).await.unwrap();
        assert_eq!(outcome, Confirmation::TimedOut);
    }

    #[tokio::test]
    async fn propagates_error_when_never_answered() {
        let source = Scripted(Mutex::new(vec![
            Err(ScanError::ChainReadFailed("down".into())),
            Err(ScanError::ChainReadFailed("still down".into())),
        ]));
        let err = wait_for_confirmation(&source, "0xabc", poll(2)).await.unwrap_err();
        assert!(matches!(err, ScanError::ChainReadFailed(m) if m == "still down"));
    }

    #[test]
    fn register_payload_converts_units() {
        let referrer = format!("0x{}", "AB".repeat(32));
        let payload = RegisterBridge::new(1234.5678919, "0xdeadBEEF", true, "Cetus USDC-SUI Pool", Some(&referrer)).unwrap();
        assert_eq!(payload.amount_micro, 1_234_567_891);
        assert_eq!(payload.source_tx_hash, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(payload.referrer, Some(format!("0x{}", "ab".repeat(32))));
    }

    #[test]
    fn register_payload_rejects_bad_input() {
        assert!(matches!(
            RegisterBridge::new(-5.0, "0xaa", false, "x", None),
            Err(ScanError::InvalidAmount(_))
        ));
        assert!(matches!(
            RegisterBridge::new(5.0, "0xaa", false, "x", Some("0x123")),
            Err(ScanError::InvalidAddress(_))
        ));
        assert!(matches!(
            RegisterBridge::new(5.0, "0xzz", false, "x", None),
            Err(ScanError::InvalidTxHash(_))
        ));
        assert!(matches!(
            RegisterBridge::new(5.0, "0xabc", false, "x", None),
            Err(ScanError::InvalidTxHash(_))
        ));
    }
}
