use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::models::{Chain, Protocol};
use super::{RateSource, RateUpdate, SourceError};

/// Max APY drift per refresh, in percentage points.
pub const ETHEREUM_DRIFT: f64 = 0.25;
pub const SUI_DRIFT: f64 = 1.0;

/// Stand-in for a rate oracle: nudges every APY by a bounded random delta.
pub struct SimulatedRates {
    rng: Mutex<StdRng>,
}

impl SimulatedRates {
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    fn drift_bound(chain: Chain) -> f64 {
        match chain {
            Chain::Ethereum => ETHEREUM_DRIFT,
            Chain::Sui => SUI_DRIFT,
        }
    }
}

impl Default for SimulatedRates {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateSource for SimulatedRates {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn fetch_rates(&self, protocols: &[Protocol]) -> Result<Vec<RateUpdate>, SourceError> {
        let mut rng = self.rng.lock();
        let updates = protocols
            .iter()
            .map(|p| {
                let bound = Self::drift_bound(p.chain);
                let delta = rng.gen_range(-bound..=bound);
                RateUpdate {
                    name: p.name.clone(),
                    apy: p.apy + delta,
                    tvl: None,
                }
            })
            .collect();
        Ok(updates)
    }
}
