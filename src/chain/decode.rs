//! Typed decoding of Sui JSON-RPC object payloads.
//!
//! The bridge registry is read through `sui_getObject` (global counters) and
//! `suix_getDynamicFieldObject` (one entry of the positions table). Move `u64`
//! fields arrive as decimal strings, byte vectors as arrays of numbers.

use serde::Deserialize;
use serde_json::Value;
use super::{GlobalStats, UserPosition, MICRO_UNITS, MULTIPLIER_BPS};

#[derive(Debug, Deserialize)]
struct ObjectResponse<T> {
    data: Option<ObjectData<T>>,
}

#[derive(Debug, Deserialize)]
struct ObjectData<T> {
    content: Option<MoveContent<T>>,
}

#[derive(Debug, Deserialize)]
struct MoveContent<T> {
    fields: T,
}

#[derive(Debug, Deserialize)]
struct DynamicField<T> {
    value: MoveContent<T>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MoveU64 {
    Text(String),
    Number(u64),
}

impl MoveU64 {
    fn get(&self) -> Option<u64> {
        match self {
            MoveU64::Text(s) => s.parse().ok(),
            MoveU64::Number(n) => Some(*n),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MoveString {
    Bytes(Vec<u8>),
    Text(String),
}

impl MoveString {
    fn into_string(self) -> Option<String> {
        match self {
            MoveString::Bytes(bytes) => String::from_utf8(bytes).ok(),
            MoveString::Text(s) => Some(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    total_bridged: MoveU64,
    unclaimed_rewards: MoveU64,
    total_earned: MoveU64,
    reward_multiplier: MoveU64,
    auto_deployed: bool,
    target_protocol: MoveString,
}

#[derive(Debug, Deserialize)]
struct RawRegistry {
    total_liquidity_bridged: MoveU64,
    total_rewards_distributed: MoveU64,
    total_users: MoveU64,
}

fn micro(v: &MoveU64) -> Option<f64> {
    v.get().map(|n| n as f64 / MICRO_UNITS)
}

/// Decodes a positions-table entry. Anything that does not decode,
/// including a "not found" error payload, is "no position".
pub fn decode_position(response: &Value) -> Option<UserPosition> {
    let parsed = ObjectResponse::<DynamicField<RawPosition>>::deserialize(response).ok()?;
    let raw = parsed.data?.content?.fields.value.fields;

    Some(UserPosition {
        total_bridged: micro(&raw.total_bridged)?,
        reward_multiplier: raw.reward_multiplier.get()? as f64 / MULTIPLIER_BPS,
        unclaimed_rewards: micro(&raw.unclaimed_rewards)?,
        total_earned: micro(&raw.total_earned)?,
        auto_deployed: raw.auto_deployed,
        target_protocol: raw.target_protocol.into_string()?,
    })
}

pub fn decode_stats(response: &Value) -> Option<GlobalStats> {
    let parsed = ObjectResponse::<RawRegistry>::deserialize(response).ok()?;
    let raw = parsed.data?.content?.fields;

    Some(GlobalStats {
        total_bridged: micro(&raw.total_liquidity_bridged)?,
        total_rewards_distributed: micro(&raw.total_rewards_distributed)?,
        total_users: raw.total_users.get()?,
    })
}
