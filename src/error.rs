use thiserror::Error;

use crate::sources::SourceError;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("live data refresh failed: {0}")]
    RefreshFailed(String),
    #[error("no destination protocol clears the spread threshold")]
    NoOpportunity,
    #[error("chain read failed: {0}")]
    ChainReadFailed(String),
    #[error("chain write failed: {0}")]
    ChainWriteFailed(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid transaction hash: {0}")]
    InvalidTxHash(String),
    #[error("config error: {0}")]
    Config(String),
}

impl ScanError {
    /// Stable identifier presentation code can branch on.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::InvalidAmount(_) => "invalid_amount",
            ScanError::RefreshFailed(_) => "refresh_failed",
            ScanError::NoOpportunity => "no_opportunity",
            ScanError::ChainReadFailed(_) => "chain_read_failed",
            ScanError::ChainWriteFailed(_) => "chain_write_failed",
            ScanError::InvalidAddress(_) => "invalid_address",
            ScanError::InvalidTxHash(_) => "invalid_tx_hash",
            ScanError::Config(_) => "config",
        }
    }
}

impl From<SourceError> for ScanError {
    fn from(e: SourceError) -> Self {
        ScanError::RefreshFailed(e.to_string())
    }
}

/// Rejects negative and non-finite amounts. Zero is a legitimate amount.
pub fn validate_amount(amount: f64) -> Result<f64, ScanError> {
    if !amount.is_finite() {
        return Err(ScanError::InvalidAmount(format!("{} is not a finite number", amount)));
    }
    if amount < 0.0 {
        return Err(ScanError::InvalidAmount(format!("{} is negative", amount)));
    }
    Ok(amount)
}

/// Parses user input such as `"5,000.50"` into a validated amount.
pub fn parse_amount(input: &str) -> Result<f64, ScanError> {
    let cleaned: String = input
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();

    let amount = cleaned
        .parse::<f64>()
        .map_err(|_| ScanError::InvalidAmount(format!("'{}' is not a number", input)))?;

    validate_amount(amount)
}
