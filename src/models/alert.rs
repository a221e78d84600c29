use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;
use super::Protocol;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, Deserialize)]
pub struct Earnings {
    pub daily: f64,
    pub monthly: f64,
    pub yearly: f64,
}

/// A destination protocol that beats the best source-chain yield.
///
/// `total_apy` and `spread` are derived from the stored inputs on every
/// access so they can never drift from them.
#[derive(Debug, Clone, PartialEq)]
pub struct OpportunityAlert {
    source_apy: f64,
    dest_apy: f64,
    bridge_bonus: f64,
    protocol: Protocol,
    estimated_earnings: Earnings,
}

impl OpportunityAlert {
    pub fn new(source_apy: f64, protocol: Protocol, bridge_bonus: f64, estimated_earnings: Earnings) -> Self {
        Self {
            source_apy,
            dest_apy: protocol.apy,
            bridge_bonus,
            protocol,
            estimated_earnings,
        }
    }

    pub fn source_apy(&self) -> f64 {
        self.source_apy
    }

    pub fn dest_apy(&self) -> f64 {
        self.dest_apy
    }

    pub fn bridge_bonus(&self) -> f64 {
        self.bridge_bonus
    }

    pub fn total_apy(&self) -> f64 {
        self.dest_apy + self.bridge_bonus
    }

    pub fn spread(&self) -> f64 {
        self.dest_apy - self.source_apy
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn estimated_earnings(&self) -> Earnings {
        self.estimated_earnings
    }
}

impl Serialize for OpportunityAlert {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("OpportunityAlert", 7)?;
        s.serialize_field("source_apy", &self.source_apy)?;
        s.serialize_field("dest_apy", &self.dest_apy)?;
        s.serialize_field("bridge_bonus", &self.bridge_bonus)?;
        s.serialize_field("total_apy", &self.total_apy())?;
        s.serialize_field("spread", &self.spread())?;
        s.serialize_field("protocol", &self.protocol)?;
        s.serialize_field("estimated_earnings", &self.estimated_earnings)?;
        s.end()
    }
}

/// Outcome of one `scan_opportunities` call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Scan {
    pub amount: f64,
    pub best_source_apy: f64,
    pub opportunities: Vec<OpportunityAlert>,
    /// Set when the refresh failed and the last-known catalog was used.
    pub stale: bool,
    pub refresh_error: Option<String>,
    pub scanned_at: DateTime<Utc>,
}

impl Scan {
    pub fn best(&self) -> Option<&OpportunityAlert> {
        self.opportunities.first()
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }
}
