use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use crate::config::ChainConfig;
use crate::error::ScanError;
use super::decode::{decode_position, decode_stats};
use super::{address, ChainReader, GlobalStats, TxStatus, TxStatusSource, UserPosition};

/// Read-only Sui JSON-RPC client for the bridge registry.
pub struct SuiRpc {
    client: Client,
    rpc_url: String,
    registry_object: String,
    positions_table: String,
    request_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl SuiRpc {
    pub fn new(config: &ChainConfig) -> Result<Self, ScanError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ScanError::Config(e.to_string()))?;

        Ok(Self {
            client,
            rpc_url: config.rpc_url.clone(),
            registry_object: config.registry_object.clone(),
            positions_table: config.positions_table.clone(),
            request_id: AtomicU64::new(1),
        })
    }

    fn is_deployed(&self) -> bool {
        !self.registry_object.is_empty() && !self.positions_table.is_empty()
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ScanError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.request_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let resp = self.client.post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::ChainReadFailed(format!("{}: {}", method, e)))?;

        if !resp.status().is_success() {
            return Err(ScanError::ChainReadFailed(format!("{}: HTTP {}", method, resp.status())));
        }

        let parsed: RpcResponse = resp.json()
            .await
            .map_err(|e| ScanError::ChainReadFailed(format!("{}: {}", method, e)))?;

        if let Some(err) = parsed.error {
            return Err(ScanError::ChainReadFailed(format!("{}: [{}] {}", method, err.code, err.message)));
        }

        parsed.result.ok_or_else(|| ScanError::ChainReadFailed(format!("{}: empty result", method)))
    }
}

#[async_trait]
impl ChainReader for SuiRpc {
    async fn user_position(&self, user: &str) -> Result<Option<UserPosition>, ScanError> {
        if !address::is_valid_sui_address(user) {
            return Err(ScanError::InvalidAddress(user.to_string()));
        }
        if !self.is_deployed() {
            tracing::warn!("Registry not configured, no positions to read");
            return Ok(None);
        }

        let result = self
            .call(
                "suix_getDynamicFieldObject",
                json!([self.positions_table, { "type": "address", "value": address::normalize(user) }]),
            )
            .await?;

        let position = decode_position(&result);
        if position.is_none() {
            tracing::debug!("No decodable position for {}", user);
        }
        Ok(position)
    }

    async fn global_stats(&self) -> Result<GlobalStats, ScanError> {
        if !self.is_deployed() {
            tracing::warn!("Registry not configured, reporting empty stats");
            return Ok(GlobalStats::default());
        }

        let result = self
            .call("sui_getObject", json!([self.registry_object, { "showContent": true }]))
            .await?;

        decode_stats(&result)
            .ok_or_else(|| ScanError::ChainReadFailed("registry object did not decode".into()))
    }
}

#[async_trait]
impl TxStatusSource for SuiRpc {
    async fn transaction_status(&self, digest: &str) -> Result<TxStatus, ScanError> {
        let result = match self
            .call("sui_getTransactionBlock", json!([digest, { "showEffects": true }]))
            .await
        {
            Ok(result) => result,
            // Not indexed yet.
            Err(ScanError::ChainReadFailed(msg)) if msg.contains("Could not find") => return Ok(TxStatus::Pending),
            Err(e) => return Err(e),
        };

        Ok(parse_effects_status(&result))
    }
}

fn parse_effects_status(result: &Value) -> TxStatus {
    let status = &result["effects"]["status"];
    match status["status"].as_str() {
        Some("success") => TxStatus::Success,
        Some("failure") => TxStatus::Failure(
            status["error"].as_str().unwrap_or("unknown error").to_string(),
        ),
        _ => TxStatus::Pending,
    }
}
