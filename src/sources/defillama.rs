use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use crate::models::Protocol;
use super::{RateSource, RateUpdate, SourceError};

const POOLS_URL: &str = "https://yields.llama.fi/pools";

/// Live APY/TVL from the DefiLlama yields API.
pub struct DefiLlamaRates {
    client: Client,
    url: String,
    /// protocol name -> DefiLlama pool id
    pool_ids: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LlamaResponse {
    data: Vec<LlamaPool>,
}

#[derive(Debug, Deserialize)]
struct LlamaPool {
    pool: String,
    apy: Option<f64>,
    #[serde(rename = "tvlUsd")]
    tvl_usd: Option<f64>,
}

impl DefiLlamaRates {
    pub fn new(pool_ids: HashMap<String, String>) -> Result<Self, SourceError> {
        Self::with_url(POOLS_URL, pool_ids)
    }

    pub fn with_url(url: &str, pool_ids: HashMap<String, String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
            pool_ids,
        })
    }

    fn match_updates(&self, protocols: &[Protocol], pools: Vec<LlamaPool>) -> Vec<RateUpdate> {
        let by_id: HashMap<&str, &LlamaPool> = pools.iter().map(|p| (p.pool.as_str(), p)).collect();

        protocols
            .iter()
            .filter_map(|protocol| {
                let id = self.pool_ids.get(&protocol.name)?;
                let pool = by_id.get(id.as_str())?;
                let apy = pool.apy.filter(|a| a.is_finite())?;
                Some(RateUpdate {
                    name: protocol.name.clone(),
                    apy,
                    tvl: pool.tvl_usd.filter(|t| t.is_finite() && *t >= 0.0).map(|t| t as u64),
                })
            })
            .collect()
    }
}

#[async_trait]
impl RateSource for DefiLlamaRates {
    fn name(&self) -> &'static str {
        "defillama"
    }

    async fn fetch_rates(&self, protocols: &[Protocol]) -> Result<Vec<RateUpdate>, SourceError> {
        let resp = self.client.get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout
                } else {
                    SourceError::Network(e.to_string())
                }
            })?;

        if resp.status() == 429 {
            return Err(SourceError::RateLimit);
        }

        if !resp.status().is_success() {
            return Err(SourceError::Network(format!("HTTP {}", resp.status())));
        }

        let data: LlamaResponse = resp.json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let updates = self.match_updates(protocols, data.data);
        tracing::debug!("defillama: {}/{} protocols matched", updates.len(), protocols.len());
        Ok(updates)
    }
}
