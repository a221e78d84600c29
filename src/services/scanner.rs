use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use crate::config::{BonusConfig, ScannerConfig};
use crate::error::{validate_amount, ScanError};
use crate::models::{seed_catalog, Chain, Earnings, OpportunityAlert, Protocol, Scan};
use crate::sources::RateSource;

/// Minimum destination-over-source APY gap, in percentage points.
pub const MIN_SPREAD: f64 = 2.0;

pub const BASE_BRIDGE_BONUS: f64 = 3.0;
pub const EARLY_BIRD_BONUS: f64 = 1.0;
pub const LARGE_DEPOSIT_BONUS: f64 = 0.5;
pub const LARGE_DEPOSIT_THRESHOLD: f64 = 10_000.0;
pub const LOW_TVL_BONUS: f64 = 1.0;
pub const LOW_TVL_THRESHOLD: u64 = 10_000_000;

/// Cross-chain yield scanner over an owned protocol catalog.
pub struct OpportunityScanner {
    source: Arc<dyn RateSource>,
    protocols: Vec<Protocol>,
    bonus: BonusConfig,
    spread_threshold: f64,
    refresh_timeout: Duration,
    last_update: DateTime<Utc>,
}

impl OpportunityScanner {
    pub fn new(source: Arc<dyn RateSource>, config: &ScannerConfig, bonus: BonusConfig) -> Self {
        let mut scanner = Self::with_catalog(source, config, bonus, Vec::new());
        scanner.initialize();
        scanner
    }

    /// Scanner over a caller-provided catalog instead of the seed set.
    pub fn with_catalog(
        source: Arc<dyn RateSource>,
        config: &ScannerConfig,
        bonus: BonusConfig,
        protocols: Vec<Protocol>,
    ) -> Self {
        Self {
            source,
            protocols,
            bonus,
            spread_threshold: config.spread_threshold,
            refresh_timeout: Duration::from_millis(config.refresh_timeout_ms),
            last_update: Utc::now(),
        }
    }

    fn initialize(&mut self) {
        self.protocols = seed_catalog();
        tracing::debug!("✓ Catalog seeded with {} protocols", self.protocols.len());
    }

    pub fn protocols(&self, chain: Chain) -> impl Iterator<Item = &Protocol> {
        self.protocols.iter().filter(move |p| p.chain == chain)
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Pulls fresh APY/TVL from the rate source and applies it in place.
    /// On error the catalog is left untouched.
    pub async fn refresh_live_data(&mut self) -> Result<usize, ScanError> {
        let fetch = self.source.fetch_rates(&self.protocols);
        let updates = match tokio::time::timeout(self.refresh_timeout, fetch).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ScanError::RefreshFailed(format!(
                    "{} did not answer within {:?}",
                    self.source.name(),
                    self.refresh_timeout
                )))
            }
        };

        let mut applied = 0;
        for update in updates {
            if let Some(protocol) = self.protocols.iter_mut().find(|p| p.name == update.name) {
                protocol.apy = update.apy;
                if let Some(tvl) = update.tvl {
                    protocol.tvl = tvl;
                }
                applied += 1;
            }
        }

        self.last_update = Utc::now();
        tracing::debug!("🔄 {} refreshed {} protocols", self.source.name(), applied);
        Ok(applied)
    }

    pub fn compute_bridge_bonus(&self, amount: f64, protocol: &Protocol) -> f64 {
        compute_bridge_bonus(&self.bonus, amount, protocol)
    }

    /// Refreshes, then ranks destination protocols that beat the best
    /// source APY by more than the spread threshold.
    pub async fn scan_opportunities(&mut self, amount: f64) -> Result<Scan, ScanError> {
        let amount = validate_amount(amount)?;

        let refresh_error = match self.refresh_live_data().await {
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Refresh via {} failed, scanning stale catalog: {}", self.source.name(), e);
                Some(e.to_string())
            }
        };

        let best_source_apy = self
            .protocols(Chain::Ethereum)
            .map(|p| p.apy)
            .reduce(f64::max)
            .unwrap_or(0.0);

        let mut opportunities: Vec<OpportunityAlert> = self
            .protocols(Chain::Sui)
            .filter(|p| p.apy > best_source_apy + self.spread_threshold)
            .map(|p| {
                let bonus = self.compute_bridge_bonus(amount, p);
                let total_apy = p.apy + bonus;
                OpportunityAlert::new(best_source_apy, p.clone(), bonus, compute_earnings(amount, total_apy))
            })
            .collect();

        opportunities.sort_by(|a, b| b.total_apy().total_cmp(&a.total_apy()));

        tracing::debug!(
            "Scan @ ${:.2}: best source {:.2}%, {} opportunities{}",
            amount,
            best_source_apy,
            opportunities.len(),
            if refresh_error.is_some() { " (stale)" } else { "" }
        );

        Ok(Scan {
            amount,
            best_source_apy,
            opportunities,
            stale: refresh_error.is_some(),
            refresh_error,
            scanned_at: Utc::now(),
        })
    }

    pub async fn get_best_opportunity(&mut self, amount: f64) -> Result<Option<OpportunityAlert>, ScanError> {
        let scan = self.scan_opportunities(amount).await?;
        Ok(scan.opportunities.into_iter().next())
    }

    pub fn time_since_last_update(&self) -> String {
        self.time_since_update_at(Utc::now())
    }

    pub fn time_since_update_at(&self, now: DateTime<Utc>) -> String {
        format_elapsed((now - self.last_update).num_seconds().max(0))
    }
}

pub fn compute_bridge_bonus(bonus: &BonusConfig, amount: f64, protocol: &Protocol) -> f64 {
    let large_deposit = if amount >= bonus.large_deposit_threshold { bonus.large_deposit } else { 0.0 };
    let low_tvl = if protocol.tvl < bonus.low_tvl_threshold { bonus.low_tvl } else { 0.0 };
    bonus.base + bonus.early_bird + large_deposit + low_tvl
}

pub fn compute_earnings(amount: f64, apy: f64) -> Earnings {
    let yearly = amount * apy / 100.0;
    Earnings {
        daily: yearly / 365.0,
        monthly: yearly / 12.0,
        yearly,
    }
}

fn format_elapsed(seconds: i64) -> String {
    if seconds < 60 {
        format!("{}s ago", seconds)
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else {
        format!("{}h ago", seconds / 3600)
    }
}
