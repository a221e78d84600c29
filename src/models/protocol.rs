use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// Source chain the USDC leaves from.
    Ethereum,
    /// Destination chain the USDC is bridged to.
    Sui,
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chain::Ethereum => write!(f, "ethereum"),
            Chain::Sui => write!(f, "sui"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Lending,
    Liquidity,
    Leverage,
    Staking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    pub name: String,
    pub chain: Chain,
    /// Percent, e.g. `5.2` for 5.2%.
    pub apy: f64,
    pub tvl: u64,
    /// 1 (safest) to 10.
    pub risk_score: u8,
    pub contract_address: String,
    pub category: Category,
}

impl Protocol {
    pub fn new(
        name: &str,
        chain: Chain,
        apy: f64,
        tvl: u64,
        risk_score: u8,
        contract_address: &str,
        category: Category,
    ) -> Self {
        Self {
            name: name.to_string(),
            chain,
            apy,
            tvl,
            risk_score: risk_score.clamp(1, 10),
            contract_address: contract_address.to_string(),
            category,
        }
    }

    pub fn risk_label(&self) -> RiskLabel {
        RiskLabel::from_score(self.risk_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLabel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=2 => RiskLabel::VeryLow,
            3..=4 => RiskLabel::Low,
            5..=6 => RiskLabel::Medium,
            7..=8 => RiskLabel::High,
            _ => RiskLabel::VeryHigh,
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLabel::VeryLow => "Very Low",
            RiskLabel::Low => "Low",
            RiskLabel::Medium => "Medium",
            RiskLabel::High => "High",
            RiskLabel::VeryHigh => "Very High",
        };
        f.write_str(label)
    }
}

/// Built-in catalog used when the scanner is constructed without one.
pub fn seed_catalog() -> Vec<Protocol> {
    vec![
        Protocol::new("Aave V3", Chain::Ethereum, 5.2, 1_000_000_000, 2, "0x...", Category::Lending),
        Protocol::new("Compound V3", Chain::Ethereum, 4.8, 500_000_000, 2, "0x...", Category::Lending),
        Protocol::new("Curve USDC Pool", Chain::Ethereum, 3.5, 2_000_000_000, 1, "0x...", Category::Liquidity),
        Protocol::new("Cetus USDC-SUI Pool", Chain::Sui, 18.0, 10_000_000, 7, "0x0", Category::Liquidity),
        Protocol::new("Turbos Finance", Chain::Sui, 22.5, 5_000_000, 8, "0x0", Category::Leverage),
        Protocol::new("Scallop Lending", Chain::Sui, 14.5, 8_000_000, 6, "0x0", Category::Lending),
    ]
}
