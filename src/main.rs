use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liquidx_scanner::api::{self, AppState};
use liquidx_scanner::chain::{ChainReader, ChainWriter, DemoChain, PollConfig, SuiRpc, TxStatusSource};
use liquidx_scanner::config::{Config, RateSourceKind};
use liquidx_scanner::error::{parse_amount, ScanError};
use liquidx_scanner::format::{format_apy, format_currency, format_tvl};
use liquidx_scanner::models::Scan;
use liquidx_scanner::services::{OpportunityScanner, RewardCalculator};
use liquidx_scanner::sources::{DefiLlamaRates, RateSource, SimulatedRates};

/// Address the demo chain registers bridges under.
const DEMO_SENDER: &str = "0x742d35cc6634c0532925a3b844bc9e7595f0beb742d35cc6634c0532925a3b84";

fn build_rate_source(config: &Config) -> Result<Arc<dyn RateSource>, ScanError> {
    let source: Arc<dyn RateSource> = match config.scanner.rate_source {
        RateSourceKind::Simulated => match config.scanner.seed {
            Some(seed) => Arc::new(SimulatedRates::with_seed(seed)),
            None => Arc::new(SimulatedRates::new()),
        },
        RateSourceKind::Defillama => Arc::new(DefiLlamaRates::new(config.oracle.pools.clone())?),
    };
    Ok(source)
}

fn arg_value<'a>(args: &'a [String], flags: &[&str]) -> Option<&'a str> {
    args.iter()
        .position(|a| flags.contains(&a.as_str()))
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
        .filter(|v| !v.starts_with("--"))
}

fn scan_header(scan: &Scan) -> String {
    format!("{} [{} opportunities] @ {}{}",
        scan.scanned_at.with_timezone(&chrono::Local).format("%H:%M:%S"),
        scan.opportunities.len(),
        format_currency(scan.amount),
        if scan.stale { " (stale)" } else { "" }
    )
}

/// Terminal mode: one ranked scan.
async fn run_scan(scanner: &mut OpportunityScanner, amount: f64) -> Result<(), ScanError> {
    let scan = scanner.scan_opportunities(amount).await?;

    println!("\n⏱️  {}", scan_header(&scan));
    println!("   best Ethereum APY: {}", format_apy(scan.best_source_apy));

    if scan.is_empty() {
        println!("   none found (spread threshold not met)");
        return Ok(());
    }

    println!("   {:22} {:>8} {:>8} {:>8} {:>8} {:>9} {:>12}", "protocol", "APY", "bonus", "total", "spread", "TVL", "yearly");
    println!("   ────────────────────── ──────── ──────── ──────── ──────── ───────── ────────────");
    for o in &scan.opportunities {
        let p = o.protocol();
        println!("   {:22} {:>8} {:>8} {:>8} {:>8} {:>9} {:>12}",
            p.name,
            format_apy(o.dest_apy()),
            format_apy(o.bridge_bonus()),
            format_apy(o.total_apy()),
            format_apy(o.spread()),
            format_tvl(p.tvl),
            format_currency(o.estimated_earnings().yearly),
        );
    }
    Ok(())
}

fn run_rewards(calculator: &RewardCalculator, amount: f64, auto_deploy: bool, referral: bool) -> Result<(), ScanError> {
    let b = calculator.calculate_rewards(amount, auto_deploy, referral)?;
    println!("\n💰 Rewards for {}", format_currency(amount));
    println!("   base:        {:>10.2} LQX", b.base_rewards);
    println!("   auto-deploy: {:>10.2} LQX", b.auto_deploy_bonus);
    println!("   referral:    {:>10.2} LQX", b.referral_bonus);
    println!("   multiplier:  {:>10.1}x", b.multiplier);
    println!("   total:       {:>10.2} LQX ({:.2}% of deposit)", b.total_rewards, b.effective_rate_pct());
    Ok(())
}

#[tokio::main(worker_threads = 4)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,liquidx_scanner=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = arg_value(&args, &["--config", "-c"]).unwrap_or("config.toml");
    let config = if std::path::Path::new(config_path).exists() {
        let config = Config::load_from(config_path)?;
        tracing::info!("✓ Configuration loaded from {}", config_path);
        config
    } else {
        tracing::warn!("{} not found, using built-in defaults", config_path);
        Config::default()
    };

    let calculator = Arc::new(RewardCalculator::new(&config.rewards));
    let source = build_rate_source(&config)?;
    let mut scanner = OpportunityScanner::new(source, &config.scanner, config.bonus.clone());
    tracing::info!("✓ Scanner ready (rate source: {})", scanner.source_name());

    if args.iter().any(|a| a == "--scan" || a == "-s") {
        let amount = match arg_value(&args, &["--scan", "-s"]) {
            Some(raw) => parse_amount(raw)?,
            None => config.scanner.default_amount,
        };
        run_scan(&mut scanner, amount).await?;
        return Ok(());
    }

    if let Some(raw) = arg_value(&args, &["--rewards", "-r"]) {
        let amount = parse_amount(raw)?;
        let auto_deploy = args.iter().any(|a| a == "--auto-deploy");
        let referral = arg_value(&args, &["--referral"]).is_some();
        run_rewards(&calculator, amount, auto_deploy, referral)?;
        return Ok(());
    }

    println!("\n🚀 LiquidX Opportunity Scanner Starting...\n");

    let reader: Arc<dyn ChainReader>;
    let writer: Option<Arc<dyn ChainWriter>>;
    let tx_status: Arc<dyn TxStatusSource>;
    if config.chain.demo {
        let demo = Arc::new(DemoChain::new(DEMO_SENDER, calculator.clone())?);
        tracing::info!("🎭 Demo chain enabled (sender {})", demo.sender());
        reader = demo.clone();
        writer = Some(demo.clone() as Arc<dyn ChainWriter>);
        tx_status = demo;
    } else {
        let rpc = Arc::new(SuiRpc::new(&config.chain)?);
        tracing::info!("📡 Sui RPC at {}", config.chain.rpc_url);
        reader = rpc.clone();
        writer = None;
        tx_status = rpc;
    }

    let state = Arc::new(AppState {
        scanner: Arc::new(Mutex::new(scanner)),
        calculator,
        reader,
        writer,
        tx_status,
        poll: PollConfig::from(&config.chain),
        default_amount: config.scanner.default_amount,
        update_interval: config.server.update_interval,
    });

    let app = api::create_rest_router(state).layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    println!("\n✓ Server ready on http://{}\n", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
