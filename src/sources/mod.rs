pub mod defillama;
pub mod simulated;

use async_trait::async_trait;
use crate::models::Protocol;

pub use defillama::DefiLlamaRates;
pub use simulated::SimulatedRates;

/// Fresh market data for one catalog entry, matched by protocol name.
#[derive(Debug, Clone, PartialEq)]
pub struct RateUpdate {
    pub name: String,
    pub apy: f64,
    pub tvl: Option<u64>,
}

/// Supplier of live APY/TVL for the scanner's catalog.
#[async_trait]
pub trait RateSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_rates(&self, protocols: &[Protocol]) -> Result<Vec<RateUpdate>, SourceError>;
}

#[derive(Debug)]
pub enum SourceError {
    Network(String),
    Parse(String),
    RateLimit,
    Timeout,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Network(e) => write!(f, "Network error: {}", e),
            SourceError::Parse(e) => write!(f, "Parse error: {}", e),
            SourceError::RateLimit => write!(f, "Rate limited"),
            SourceError::Timeout => write!(f, "Timed out"),
        }
    }
}

impl std::error::Error for SourceError {}
