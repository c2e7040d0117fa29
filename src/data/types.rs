//! Typed model of a single option contract.
//!
//! The raw serde layer in `raw.rs` mirrors the brokerage payload; the types
//! here are the sanitized view the rest of the engine consumes. Greeks the
//! feed failed to compute arrive as a "NaN" sentinel and are repaired to 0.0
//! at construction, with the pre-repair values kept for chain searches.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::raw::RawContract;

/// Errors raised while turning a raw chain document into the typed model.
///
/// These are fatal for the affected instrument only; the scanner logs the
/// symbol and moves on with the rest of the batch.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("{symbol}: contract record is missing required field `{field}`")]
    MissingField { symbol: String, field: &'static str },

    #[error("{symbol}: chain document failed to decode: {source}")]
    Malformed {
        symbol: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{symbol}: unparseable expiration key `{key}`")]
    BadExpirationKey { symbol: String, key: String },
}

/// Put/call designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PutCall {
    Put,
    Call,
}

impl PutCall {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "P" | "PUT" => Some(Self::Put),
            "C" | "CALL" => Some(Self::Call),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Put => "PUT",
            Self::Call => "CALL",
        }
    }
}

/// Sanitized greeks. Feed sentinels are already repaired to 0.0 here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub theta: f64,
    pub gamma: f64,
    pub vega: f64,
}

/// Greeks exactly as the feed sent them. `None` marks the "NaN" sentinel the
/// API returns for a greek it did not compute.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawGreeks {
    pub delta: Option<f64>,
    pub theta: Option<f64>,
    pub gamma: Option<f64>,
    pub vega: Option<f64>,
}

/// Underlying quote snapshot taken with the chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderlyingQuote {
    pub last: Decimal,
    pub low: Decimal,
    pub high: Decimal,
}

/// One option contract at one instant.
#[derive(Debug, Clone)]
pub struct Strike {
    /// Contract symbol, e.g. "MSFT_082120P205".
    pub symbol: String,

    /// Human-readable description, e.g. "MSFT Aug 21 2020 205 Put".
    pub description: String,

    pub put_call: PutCall,

    /// Strike price.
    pub strike: Decimal,

    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,

    /// Mid price, (bid + ask) / 2.
    pub mid: Decimal,

    /// Bid-ask spread, ask - bid. A negative spread signals bad market data
    /// and is propagated as-is rather than rejected.
    pub spread: Decimal,

    /// Days to expiration.
    pub dte: i64,

    pub open_interest: i64,
    pub volume: i64,

    pub greeks: Greeks,

    /// Pre-repair greeks, kept for attribute searches.
    pub raw_greeks: RawGreeks,
}

fn req<T>(symbol: &str, field: &'static str, value: Option<T>) -> Result<T, ChainError> {
    value.ok_or_else(|| ChainError::MissingField {
        symbol: symbol.to_string(),
        field,
    })
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or_default()
}

impl Strike {
    /// Build a strike from one raw contract record.
    ///
    /// Missing required fields fail the whole instrument; sentinel greeks
    /// are repaired silently.
    pub fn from_raw(underlying: &str, raw: &RawContract) -> Result<Self, ChainError> {
        let description = req(underlying, "description", raw.description.clone())?;
        let symbol = req(underlying, "symbol", raw.symbol.clone())?;
        let put_call_str = req(underlying, "putCall", raw.put_call.clone())?;
        let put_call = req(underlying, "putCall", PutCall::from_str(&put_call_str))?;

        let strike = to_decimal(req(underlying, "strikePrice", raw.strike_price)?);
        let bid = to_decimal(req(underlying, "bid", raw.bid)?);
        let ask = to_decimal(req(underlying, "ask", raw.ask)?);
        let last = to_decimal(raw.last.unwrap_or(0.0));
        let dte = req(underlying, "daysToExpiration", raw.days_to_expiration)?;
        let open_interest = req(underlying, "openInterest", raw.open_interest)?;
        let volume = req(underlying, "totalVolume", raw.total_volume)?;

        let raw_greeks = RawGreeks {
            delta: raw.delta,
            theta: raw.theta,
            gamma: raw.gamma,
            vega: raw.vega,
        };

        Ok(Self {
            symbol,
            description,
            put_call,
            strike,
            bid,
            ask,
            last,
            mid: (bid + ask) / Decimal::from(2),
            spread: ask - bid,
            dte,
            open_interest,
            volume,
            greeks: Greeks {
                delta: raw.delta.unwrap_or(0.0),
                theta: raw.theta.unwrap_or(0.0),
                gamma: raw.gamma.unwrap_or(0.0),
                vega: raw.vega.unwrap_or(0.0),
            },
            raw_greeks,
        })
    }
}
