use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use crate::chain::{
    wait_for_confirmation, ChainReader, ChainWriter, Confirmation, GlobalStats, PollConfig, RegisterBridge,
    TxStatusSource, UserPosition,
};
use crate::error::{parse_amount, ScanError};
use crate::models::{Chain, OpportunityAlert, Protocol, RewardBreakdown, Scan};
use crate::services::{OpportunityScanner, RewardCalculator};

pub struct AppState {
    pub scanner: Arc<Mutex<OpportunityScanner>>,
    pub calculator: Arc<RewardCalculator>,
    pub reader: Arc<dyn ChainReader>,
    /// Absent unless a chain that can accept registrations is configured.
    pub writer: Option<Arc<dyn ChainWriter>>,
    pub tx_status: Arc<dyn TxStatusSource>,
    pub poll: PollConfig,
    pub default_amount: f64,
    pub update_interval: u64,
}

impl AppState {
    pub fn amount_or_default(&self, raw: Option<&str>) -> Result<f64, ScanError> {
        match raw {
            Some(s) => parse_amount(s),
            None => Ok(self.default_amount),
        }
    }
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let status = match &self {
            ScanError::InvalidAmount(_) | ScanError::InvalidAddress(_) | ScanError::InvalidTxHash(_) => {
                StatusCode::BAD_REQUEST
            }
            ScanError::NoOpportunity => StatusCode::NOT_FOUND,
            ScanError::ChainReadFailed(_) | ScanError::ChainWriteFailed(_) | ScanError::RefreshFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            ScanError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct AmountQuery {
    amount: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RewardsQuery {
    amount: String,
    #[serde(default)]
    auto_deploy: bool,
    referral: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BridgeRequest {
    amount: f64,
    source_tx_hash: String,
    #[serde(default)]
    auto_deploy: bool,
    target_protocol: String,
    referrer: Option<String>,
}

/// GET /opportunities?amount=
async fn get_opportunities(
    State(state): State<Arc<AppState>>,
    Query(q): Query<AmountQuery>,
) -> Result<Json<Scan>, ScanError> {
    let amount = state.amount_or_default(q.amount.as_deref())?;
    let scan = state.scanner.lock().await.scan_opportunities(amount).await?;
    Ok(Json(scan))
}

/// GET /opportunities/best?amount= - `null` when nothing clears the spread
async fn get_best_opportunity(
    State(state): State<Arc<AppState>>,
    Query(q): Query<AmountQuery>,
) -> Result<Json<Option<OpportunityAlert>>, ScanError> {
    let amount = state.amount_or_default(q.amount.as_deref())?;
    let best = state.scanner.lock().await.get_best_opportunity(amount).await?;
    Ok(Json(best))
}

/// GET /protocols
async fn get_protocols(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let scanner = state.scanner.lock().await;
    let ethereum: Vec<&Protocol> = scanner.protocols(Chain::Ethereum).collect();
    let sui: Vec<&Protocol> = scanner.protocols(Chain::Sui).collect();
    Json(serde_json::json!({
        "ethereum": ethereum,
        "sui": sui,
        "source": scanner.source_name(),
        "last_update": scanner.last_update(),
        "updated": scanner.time_since_last_update(),
    }))
}

/// GET /rewards?amount=&auto_deploy=&referral=
async fn get_rewards(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RewardsQuery>,
) -> Result<Json<RewardBreakdown>, ScanError> {
    let amount = parse_amount(&q.amount)?;
    let has_referral = q.referral.as_deref().map(|r| !r.trim().is_empty()).unwrap_or(false);
    let breakdown = state.calculator.calculate_rewards(amount, q.auto_deploy, has_referral)?;
    Ok(Json(breakdown))
}

/// GET /position/:address
async fn get_position(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<Option<UserPosition>>, ScanError> {
    Ok(Json(state.reader.user_position(&address).await?))
}

/// GET /stats
async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<GlobalStats>, ScanError> {
    Ok(Json(state.reader.global_stats().await?))
}

fn writer(state: &AppState) -> Result<&Arc<dyn ChainWriter>, ScanError> {
    state
        .writer
        .as_ref()
        .ok_or_else(|| ScanError::ChainWriteFailed("no chain writer configured".into()))
}

/// POST /bridge
async fn post_bridge(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BridgeRequest>,
) -> Result<Json<serde_json::Value>, ScanError> {
    let writer = writer(&state)?;

    let payload = RegisterBridge::new(
        req.amount,
        &req.source_tx_hash,
        req.auto_deploy,
        &req.target_protocol,
        req.referrer.as_deref(),
    )?;
    let digest = writer.submit_register_bridge(payload).await?;
    Ok(Json(serde_json::json!({ "digest": digest })))
}

/// POST /claim
async fn post_claim(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ScanError> {
    let digest = writer(&state)?.submit_claim_rewards().await?;
    Ok(Json(serde_json::json!({ "digest": digest })))
}

/// GET /tx/:digest - blocks until confirmed, failed or out of attempts
async fn get_tx(
    State(state): State<Arc<AppState>>,
    Path(digest): Path<String>,
) -> Result<Json<Confirmation>, ScanError> {
    let outcome = wait_for_confirmation(state.tx_status.as_ref(), &digest, state.poll).await?;
    Ok(Json(outcome))
}

/// GET /health
async fn health() -> &'static str {
    "OK"
}

pub fn create_rest_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/opportunities", get(get_opportunities))
        .route("/opportunities/best", get(get_best_opportunity))
        .route("/protocols", get(get_protocols))
        .route("/rewards", get(get_rewards))
        .route("/position/:address", get(get_position))
        .route("/stats", get(get_stats))
        .route("/bridge", post(post_bridge))
        .route("/claim", post(post_claim))
        .route("/tx/:digest", get(get_tx))
        .route("/health", get(health))
        .route("/ws", get(super::ws_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use std::time::Duration;
    use crate::chain::DemoChain;
    use crate::config::{BonusConfig, ScannerConfig};
    use crate::models::Category;
    use crate::sources::{RateSource, RateUpdate, SourceError};

    struct FrozenRates;

    #[async_trait]
    impl RateSource for FrozenRates {
        fn name(&self) -> &'static str {
            "frozen"
        }

        async fn fetch_rates(&self, _protocols: &[Protocol]) -> Result<Vec<RateUpdate>, SourceError> {
            Ok(vec![])
        }
    }

    fn user() -> String {
        format!("0x{}", "3".repeat(64))
    }

    fn state(catalog: Vec<Protocol>, with_writer: bool) -> Arc<AppState> {
        let calculator = Arc::new(RewardCalculator::default());
        let demo = Arc::new(DemoChain::new(&user(), calculator.clone()).unwrap());
        let scanner = OpportunityScanner::with_catalog(
            Arc::new(FrozenRates),
            &ScannerConfig::default(),
            BonusConfig::default(),
            catalog,
        );
        Arc::new(AppState {
            scanner: Arc::new(Mutex::new(scanner)),
            calculator,
            reader: demo.clone(),
            writer: if with_writer { Some(demo.clone() as Arc<dyn ChainWriter>) } else { None },
            tx_status: demo,
            poll: PollConfig { max_attempts: 3, delay: Duration::from_millis(1) },
            default_amount: 5000.0,
            update_interval: 30,
        })
    }

    fn flat_catalog() -> Vec<Protocol> {
        vec![
            Protocol::new("Aave V3", Chain::Ethereum, 5.2, 1_000_000_000, 2, "0x...", Category::Lending),
            Protocol::new("Flat Pool", Chain::Sui, 7.0, 50_000_000, 5, "0x0", Category::Liquidity),
        ]
    }

    fn amount(raw: &str) -> Query<AmountQuery> {
        Query(AmountQuery { amount: Some(raw.to_string()) })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn error_response(err: ScanError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        (status, body_json(response).await)
    }

    #[tokio::test]
    async fn bad_amounts_are_400() {
        let state = state(crate::models::seed_catalog(), true);

        for raw in ["-1", "abc"] {
            let err = get_opportunities(State(state.clone()), amount(raw)).await.unwrap_err();
            let (status, body) = error_response(err).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "invalid_amount");
        }

        let err = get_best_opportunity(State(state.clone()), amount("-1")).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_best_opportunity_is_null() {
        let state = state(flat_catalog(), true);
        let Json(best) = get_best_opportunity(State(state.clone()), Query(AmountQuery { amount: None }))
            .await
            .unwrap();
        assert!(best.is_none());
        assert_eq!(serde_json::to_value(&best).unwrap(), serde_json::Value::Null);

        let Json(scan) = get_opportunities(State(state), amount("1000")).await.unwrap();
        assert!(scan.is_empty());
    }

    #[tokio::test]
    async fn best_opportunity_uses_default_amount() {
        let state = state(crate::models::seed_catalog(), true);
        let Json(best) = get_best_opportunity(State(state), Query(AmountQuery { amount: None }))
            .await
            .unwrap();
        assert_eq!(best.unwrap().protocol().name, "Turbos Finance");
    }

    #[tokio::test]
    async fn invalid_position_address_is_400() {
        let state = state(flat_catalog(), true);
        let err = get_position(State(state.clone()), Path("0x12".to_string())).await.unwrap_err();
        let (status, body) = error_response(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_address");

        let Json(none) = get_position(State(state), Path(user())).await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn rewards_breakdown_and_bad_amount() {
        let state = state(flat_catalog(), true);
        let q = RewardsQuery { amount: "5000".into(), auto_deploy: true, referral: Some("FRIEND".into()) };
        let Json(b) = get_rewards(State(state.clone()), Query(q)).await.unwrap();
        assert!((b.total_rewards - 79.125).abs() < 1e-9);

        let q = RewardsQuery { amount: "NaN".into(), auto_deploy: false, referral: None };
        let err = get_rewards(State(state), Query(q)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    fn bridge_request(hash: &str) -> BridgeRequest {
        BridgeRequest {
            amount: 5000.0,
            source_tx_hash: hash.to_string(),
            auto_deploy: false,
            target_protocol: "Cetus USDC-SUI Pool".to_string(),
            referrer: None,
        }
    }

    #[tokio::test]
    async fn bridge_without_writer_is_502() {
        let state = state(flat_catalog(), false);
        let err = post_bridge(State(state.clone()), Json(bridge_request("0xabcd"))).await.unwrap_err();
        let (status, body) = error_response(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "chain_write_failed");

        let err = post_claim(State(state)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn malformed_tx_hash_is_400() {
        let state = state(flat_catalog(), true);
        let err = post_bridge(State(state), Json(bridge_request("0xnothex"))).await.unwrap_err();
        let (status, body) = error_response(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_tx_hash");
    }

    #[tokio::test]
    async fn bridge_then_claim_round_trip() {
        let state = state(flat_catalog(), true);

        let Json(resp) = post_bridge(State(state.clone()), Json(bridge_request("0xabcd"))).await.unwrap();
        let digest = resp["digest"].as_str().unwrap().to_string();
        let Json(outcome) = get_tx(State(state.clone()), Path(digest)).await.unwrap();
        assert_eq!(outcome, Confirmation::Confirmed);

        let Json(resp) = post_claim(State(state.clone())).await.unwrap();
        assert!(resp["digest"].as_str().unwrap().starts_with("0x"));

        let Json(position) = get_position(State(state.clone()), Path(user())).await.unwrap();
        let position = position.unwrap();
        assert_eq!(position.unclaimed_rewards, 0.0);
        assert_eq!(position.total_earned, 56.25);

        let Json(stats) = get_stats(State(state)).await.unwrap();
        assert_eq!(stats.total_users, 1);
    }
}
