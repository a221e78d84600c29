use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::ScanError;
use crate::services::rewards::{
    MultiplierTier, AUTO_DEPLOY_BONUS_RATE, BASE_REWARD_RATE, REFERRAL_BONUS_RATE,
};
use crate::services::scanner::{
    BASE_BRIDGE_BONUS, EARLY_BIRD_BONUS, LARGE_DEPOSIT_BONUS, LARGE_DEPOSIT_THRESHOLD,
    LOW_TVL_BONUS, LOW_TVL_THRESHOLD, MIN_SPREAD,
};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub bonus: BonusConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RateSourceKind {
    Simulated,
    Defillama,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    #[serde(default = "default_spread")]
    pub spread_threshold: f64,
    #[serde(default = "default_amount")]
    pub default_amount: f64,
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_ms: u64,
    #[serde(default = "default_rate_source")]
    pub rate_source: RateSourceKind,
    /// Fixes the simulator RNG for reproducible runs.
    pub seed: Option<u64>,
}

fn default_spread() -> f64 { MIN_SPREAD }
fn default_amount() -> f64 { 5000.0 }
fn default_refresh_timeout() -> u64 { 5000 }
fn default_rate_source() -> RateSourceKind { RateSourceKind::Simulated }

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            spread_threshold: default_spread(),
            default_amount: default_amount(),
            refresh_timeout_ms: default_refresh_timeout(),
            rate_source: default_rate_source(),
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BonusConfig {
    pub base: f64,
    pub early_bird: f64,
    pub large_deposit: f64,
    pub large_deposit_threshold: f64,
    pub low_tvl: f64,
    pub low_tvl_threshold: u64,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            base: BASE_BRIDGE_BONUS,
            early_bird: EARLY_BIRD_BONUS,
            large_deposit: LARGE_DEPOSIT_BONUS,
            large_deposit_threshold: LARGE_DEPOSIT_THRESHOLD,
            low_tvl: LOW_TVL_BONUS,
            low_tvl_threshold: LOW_TVL_THRESHOLD,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RewardsConfig {
    pub base_rate: f64,
    pub auto_deploy_bonus: f64,
    pub referral_bonus: f64,
    pub tiers: Vec<MultiplierTier>,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            base_rate: BASE_REWARD_RATE,
            auto_deploy_bonus: AUTO_DEPLOY_BONUS_RATE,
            referral_bonus: REFERRAL_BONUS_RATE,
            tiers: MultiplierTier::defaults(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    #[serde(default = "default_demo")]
    pub demo: bool,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default)]
    pub registry_object: String,
    #[serde(default)]
    pub positions_table: String,
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    #[serde(default = "default_poll_delay")]
    pub poll_delay_ms: u64,
}

fn default_demo() -> bool { true }
fn default_rpc_url() -> String { "https://fullnode.testnet.sui.io:443".to_string() }
fn default_poll_attempts() -> u32 { 30 }
fn default_poll_delay() -> u64 { 2000 }

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            demo: default_demo(),
            rpc_url: default_rpc_url(),
            registry_object: String::new(),
            positions_table: String::new(),
            poll_attempts: default_poll_attempts(),
            poll_delay_ms: default_poll_delay(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds between WebSocket scan pushes.
    #[serde(default = "default_update_interval")]
    pub update_interval: u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_update_interval() -> u64 { 30 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            update_interval: default_update_interval(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OracleConfig {
    /// Protocol name -> DefiLlama pool id.
    #[serde(default)]
    pub pools: HashMap<String, String>,
}

impl Config {
    pub fn load() -> Result<Self, ScanError> {
        Self::load_from("config.toml")
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ScanError::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ScanError> {
        let config: Config = toml::from_str(content).map_err(|e| ScanError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ScanError> {
        if !self.scanner.spread_threshold.is_finite() || self.scanner.spread_threshold < 0.0 {
            return Err(ScanError::Config("scanner.spread_threshold must be >= 0".into()));
        }
        if self.scanner.refresh_timeout_ms == 0 {
            return Err(ScanError::Config("scanner.refresh_timeout_ms must be at least 1".into()));
        }
        if !self.scanner.default_amount.is_finite() || self.scanner.default_amount < 0.0 {
            return Err(ScanError::Config("scanner.default_amount must be a finite amount >= 0".into()));
        }
        if self.rewards.tiers.is_empty() {
            return Err(ScanError::Config("rewards.tiers must not be empty".into()));
        }
        if self.rewards.tiers.windows(2).any(|w| w[1].min <= w[0].min || w[1].multiplier < w[0].multiplier) {
            return Err(ScanError::Config("rewards.tiers must ascend in min and multiplier".into()));
        }
        if self.chain.poll_attempts == 0 {
            return Err(ScanError::Config("chain.poll_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_builtin_constants() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.scanner.spread_threshold, 2.0);
        assert_eq!(config.rewards.base_rate, 0.0075);
        assert_eq!(config.rewards.tiers.len(), 4);
        assert_eq!(config.chain.poll_attempts, 30);
        assert_eq!(config.chain.poll_delay_ms, 2000);
        assert_eq!(config.scanner.rate_source, RateSourceKind::Simulated);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse(
            r#"
            [scanner]
            spread_threshold = 3.5
            rate_source = "defillama"
            seed = 7

            [rewards]
            base_rate = 0.01

            [oracle.pools]
            "Aave V3" = "aa70268e-4b52-42bf-a116-608b370f9501"
            "#,
        )
        .unwrap();
        assert_eq!(config.scanner.spread_threshold, 3.5);
        assert_eq!(config.scanner.rate_source, RateSourceKind::Defillama);
        assert_eq!(config.scanner.seed, Some(7));
        assert_eq!(config.rewards.base_rate, 0.01);
        assert_eq!(config.rewards.referral_bonus, 0.10);
        assert_eq!(config.oracle.pools.len(), 1);
    }

    #[test]
    fn zero_timeout_and_bad_default_amount_are_rejected() {
        for body in [
            "[scanner]\nrefresh_timeout_ms = 0",
            "[scanner]\ndefault_amount = -100.0",
            "[scanner]\ndefault_amount = nan",
            "[scanner]\ndefault_amount = inf",
        ] {
            assert!(matches!(Config::parse(body), Err(ScanError::Config(_))), "accepted: {}", body);
        }
    }

    #[test]
    fn descending_tiers_are_rejected() {
        let err = Config::parse(
            r#"
            [[rewards.tiers]]
            min = 1000.0
            multiplier = 2.0

            [[rewards.tiers]]
            min = 0.0
            multiplier = 1.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }
}
