//! Serde model of the raw option-chain document.
//!
//! Mirrors the brokerage payload one-to-one for the fields the screener
//! consumes. Everything else the API sends is ignored at deserialization
//! rather than attached dynamically.
//!
//! Expiration maps are keyed `"YYYY-MM-DD:days"`, each mapping a strike
//! label to a list of contract records (single-element in practice).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// `"YYYY-MM-DD:days"` -> strike label -> contract records.
///
/// `BTreeMap` keeps expirations chronological and the whole parse
/// deterministic.
pub type RawExpDateMap = BTreeMap<String, BTreeMap<String, Vec<RawContract>>>;

/// Full chain document for one underlying.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOptionChain {
    pub symbol: String,

    #[serde(default)]
    pub number_of_contracts: i64,

    #[serde(default)]
    pub interest_rate: f64,

    pub underlying: Option<RawUnderlying>,

    #[serde(default)]
    pub put_exp_date_map: RawExpDateMap,

    #[serde(default)]
    pub call_exp_date_map: RawExpDateMap,
}

/// Underlying quote embedded in the chain document.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUnderlying {
    pub last: Option<f64>,
    pub low_price: Option<f64>,
    pub high_price: Option<f64>,
}

/// One contract record as delivered by the API.
///
/// Required fields are validated in `Strike::from_raw`, not here, so a
/// malformed record fails its instrument with a field-level error instead
/// of a serde one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContract {
    pub put_call: Option<String>,
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    #[serde(default)]
    pub last: Option<f64>,
    pub strike_price: Option<f64>,
    pub days_to_expiration: Option<i64>,
    pub open_interest: Option<i64>,
    pub total_volume: Option<i64>,
    #[serde(default, deserialize_with = "greek")]
    pub delta: Option<f64>,
    #[serde(default, deserialize_with = "greek")]
    pub theta: Option<f64>,
    #[serde(default, deserialize_with = "greek")]
    pub gamma: Option<f64>,
    #[serde(default, deserialize_with = "greek")]
    pub vega: Option<f64>,
}

/// Greek fields come back as a number, or the literal string "NaN" when the
/// feed has no value. Both the string sentinel and an absent field map to
/// `None`.
fn greek<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum GreekField {
        Number(f64),
        Sentinel(String),
    }

    Ok(match Option::<GreekField>::deserialize(deserializer)? {
        Some(GreekField::Number(v)) => Some(v),
        Some(GreekField::Sentinel(_)) | None => None,
    })
}
