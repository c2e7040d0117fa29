//! Option chain model: expirations grouped from the raw document.
//!
//! An expiration is kept only when the raw document lists it on both the
//! put and call side; single-sided dates are dropped, matching the feed
//! assumption that the two maps share keys.

use chrono::NaiveDate;
use tracing::info;

use super::raw::{RawOptionChain, RawUnderlying};
use super::types::{ChainError, Strike, UnderlyingQuote};

/// Canonical display format for expiration labels, e.g. "21 Aug 20".
const EXPIRATION_FORMAT: &str = "%d %b %y";

/// The puts and calls listed for one underlying at one expiration.
#[derive(Debug, Clone)]
pub struct ExpirationDate {
    /// Underlying symbol.
    pub symbol: String,

    /// Canonical expiration label.
    pub label: String,

    pub date: NaiveDate,

    /// Days to expiration, from the raw map key.
    pub dte: i64,

    /// Put strikes, ascending by strike price.
    pub puts: Vec<Strike>,

    /// Call strikes, ascending by strike price.
    pub calls: Vec<Strike>,
}

impl ExpirationDate {
    /// Total listed strikes, both sides.
    pub fn len(&self) -> usize {
        self.puts.len() + self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.calls.is_empty()
    }
}

/// Attribute a chain search can band on.
///
/// Greeks carry the feed's sentinel; a sentinel value matches any band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Delta,
    Theta,
    Gamma,
    Vega,
    Bid,
    Ask,
    Last,
    Mid,
    Volume,
    OpenInterest,
}

fn search_value(strike: &Strike, field: SearchField) -> Option<f64> {
    match field {
        SearchField::Delta => strike.raw_greeks.delta,
        SearchField::Theta => strike.raw_greeks.theta,
        SearchField::Gamma => strike.raw_greeks.gamma,
        SearchField::Vega => strike.raw_greeks.vega,
        SearchField::Bid => Some(strike.bid.try_into().unwrap_or(0.0)),
        SearchField::Ask => Some(strike.ask.try_into().unwrap_or(0.0)),
        SearchField::Last => Some(strike.last.try_into().unwrap_or(0.0)),
        SearchField::Mid => Some(strike.mid.try_into().unwrap_or(0.0)),
        SearchField::Volume => Some(strike.volume as f64),
        SearchField::OpenInterest => Some(strike.open_interest as f64),
    }
}

/// All expirations for one underlying at fetch time. Immutable once built.
#[derive(Debug, Clone)]
pub struct OptionChain {
    pub symbol: String,

    /// Contract count reported by the API.
    pub contract_count: i64,

    pub interest_rate: f64,

    pub underlying: UnderlyingQuote,

    /// Expirations in chronological order.
    pub dates: Vec<ExpirationDate>,
}

impl OptionChain {
    /// Decode and build a chain from a raw JSON document.
    pub fn from_json(symbol: &str, json: &str, horizon_days: i64) -> Result<Self, ChainError> {
        let raw: RawOptionChain =
            serde_json::from_str(json).map_err(|source| ChainError::Malformed {
                symbol: symbol.to_string(),
                source,
            })?;
        Self::from_raw(&raw, horizon_days)
    }

    /// Build a chain from the decoded document, keeping expirations up to
    /// `horizon_days` out.
    pub fn from_raw(raw: &RawOptionChain, horizon_days: i64) -> Result<Self, ChainError> {
        let symbol = raw.symbol.clone();
        let underlying = parse_underlying(&symbol, raw.underlying.as_ref())?;

        let mut dates = Vec::new();
        for (key, put_strikes) in &raw.put_exp_date_map {
            // both sides must list the date; unmatched sides are dropped
            let Some(call_strikes) = raw.call_exp_date_map.get(key) else {
                continue;
            };

            let (date, dte) = parse_expiration_key(&symbol, key)?;
            if dte > horizon_days {
                continue;
            }

            let mut puts = Vec::new();
            for records in put_strikes.values() {
                if let Some(record) = records.first() {
                    puts.push(Strike::from_raw(&symbol, record)?);
                }
            }

            let mut calls = Vec::new();
            for records in call_strikes.values() {
                if let Some(record) = records.first() {
                    calls.push(Strike::from_raw(&symbol, record)?);
                }
            }

            puts.sort_by(|a, b| a.strike.cmp(&b.strike));
            calls.sort_by(|a, b| a.strike.cmp(&b.strike));

            dates.push(ExpirationDate {
                symbol: symbol.clone(),
                label: date.format(EXPIRATION_FORMAT).to_string(),
                date,
                dte,
                puts,
                calls,
            });
        }

        let chain = Self {
            symbol,
            contract_count: raw.number_of_contracts,
            interest_rate: raw.interest_rate,
            underlying,
            dates,
        };

        info!(
            symbol = %chain.symbol,
            expirations = chain.dates.len(),
            strikes = chain.strike_count(),
            "built option chain"
        );

        Ok(chain)
    }

    /// Total strikes across all retained expirations.
    pub fn strike_count(&self) -> usize {
        self.dates.iter().map(ExpirationDate::len).sum()
    }

    /// Band strikes on one attribute ahead of spread construction.
    ///
    /// A strike whose attribute carries the feed sentinel is included
    /// unconditionally; otherwise the bounds are strict:
    /// `low < value < high`.
    pub fn search(
        &self,
        field: SearchField,
        low: f64,
        high: f64,
    ) -> Vec<(&ExpirationDate, Vec<&Strike>)> {
        self.dates
            .iter()
            .map(|date| {
                let hits = date
                    .puts
                    .iter()
                    .chain(date.calls.iter())
                    .filter(|strike| match search_value(strike, field) {
                        None => true,
                        Some(value) => value > low && value < high,
                    })
                    .collect();
                (date, hits)
            })
            .collect()
    }
}

fn parse_underlying(
    symbol: &str,
    raw: Option<&RawUnderlying>,
) -> Result<UnderlyingQuote, ChainError> {
    let missing = |field| ChainError::MissingField {
        symbol: symbol.to_string(),
        field,
    };

    let raw = raw.ok_or_else(|| missing("underlying"))?;
    // a zero last price would divide out of every %OTM downstream
    let last = match raw.last {
        Some(last) if last > 0.0 => last,
        _ => return Err(missing("underlying.last")),
    };

    Ok(UnderlyingQuote {
        last: rust_decimal::Decimal::try_from(last).unwrap_or_default(),
        low: rust_decimal::Decimal::try_from(raw.low_price.unwrap_or(0.0)).unwrap_or_default(),
        high: rust_decimal::Decimal::try_from(raw.high_price.unwrap_or(0.0)).unwrap_or_default(),
    })
}

/// Raw keys look like "2020-08-21:6"; split off the DTE suffix and parse
/// the date.
fn parse_expiration_key(symbol: &str, key: &str) -> Result<(NaiveDate, i64), ChainError> {
    let bad_key = || ChainError::BadExpirationKey {
        symbol: symbol.to_string(),
        key: key.to_string(),
    };

    let (date_part, dte_part) = key.split_once(':').ok_or_else(bad_key)?;
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| bad_key())?;
    let dte: i64 = dte_part.parse().map_err(|_| bad_key())?;

    Ok((date, dte))
}
