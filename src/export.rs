//! Flat-record export for analyzed spreads.
//!
//! Every acceptable spread flattens into a `SpreadRecord` whose field
//! declaration order is the output column order. The header list is static;
//! sinks are injected wherever records need to go.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write as _};
use std::path::{Path, PathBuf};

use chrono::Local;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analytics::Spread;

/// Output column headers, in record order.
pub const COLUMNS: [&str; 37] = [
    "Symbol",
    "Type",
    "DTE",
    "Expiration Date",
    "S. Strike",
    "L. Strike",
    "UL Last",
    "% OTM",
    "UL Low",
    "UL High",
    "Net Credit",
    "Premium",
    "Max Loss",
    "R/R",
    "POP",
    "Score",
    "L. B/A Spread",
    "S. B/A Spread",
    "Total B/A Spread",
    "L. Volume",
    "S. Volume",
    "Avg Volume",
    "S. Open Interest",
    "L. Open Interest",
    "S. Delta",
    "L. Delta",
    "Net Delta",
    "S. Theta",
    "L. Theta",
    "Net Theta",
    "S. Gamma",
    "L. Gamma",
    "Net Gamma",
    "S. Vega",
    "L. Vega",
    "Net Vega",
    "Assumption",
];

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One spread flattened for export. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadRecord {
    pub symbol: String,
    #[serde(rename = "type")]
    pub spread_type: String,
    pub dte: i64,
    pub expiration: String,
    pub short_strike: Decimal,
    pub long_strike: Decimal,
    pub ul_last: Decimal,
    pub pct_otm: f64,
    pub ul_low: Decimal,
    pub ul_high: Decimal,
    pub net_credit: Decimal,
    pub profit: Decimal,
    pub max_risk: Decimal,
    pub risk_reward: Decimal,
    pub pop: f64,
    pub score: f64,
    pub long_spread: Decimal,
    pub short_spread: Decimal,
    pub total_spread: Decimal,
    pub long_volume: i64,
    pub short_volume: i64,
    pub avg_volume: f64,
    pub short_oi: i64,
    pub long_oi: i64,
    pub short_delta: f64,
    pub long_delta: f64,
    pub net_delta: f64,
    pub short_theta: f64,
    pub long_theta: f64,
    pub net_theta: f64,
    pub short_gamma: f64,
    pub long_gamma: f64,
    pub net_gamma: f64,
    pub short_vega: f64,
    pub long_vega: f64,
    pub net_vega: f64,
    pub assumption: String,
}

impl From<&Spread> for SpreadRecord {
    fn from(spread: &Spread) -> Self {
        Self {
            symbol: spread.symbol.clone(),
            spread_type: spread.spread_type.code().to_string(),
            dte: spread.short.dte,
            expiration: spread.expiration.clone(),
            short_strike: spread.short.strike,
            long_strike: spread.long.strike,
            ul_last: spread.underlying.last,
            pct_otm: spread.percent_otm,
            ul_low: spread.underlying.low,
            ul_high: spread.underlying.high,
            net_credit: spread.net_credit,
            profit: spread.profit,
            max_risk: spread.max_risk,
            risk_reward: spread.risk_reward,
            pop: spread.pop,
            score: spread.score,
            long_spread: spread.long.spread,
            short_spread: spread.short.spread,
            total_spread: spread.total_spread,
            long_volume: spread.long.volume,
            short_volume: spread.short.volume,
            avg_volume: spread.avg_volume,
            short_oi: spread.short.open_interest,
            long_oi: spread.long.open_interest,
            short_delta: spread.short.greeks.delta,
            long_delta: spread.long.greeks.delta,
            net_delta: spread.net_delta,
            short_theta: spread.short.greeks.theta,
            long_theta: spread.long.greeks.theta,
            net_theta: spread.net_theta,
            short_gamma: spread.short.greeks.gamma,
            long_gamma: spread.long.greeks.gamma,
            net_gamma: spread.net_gamma,
            short_vega: spread.short.greeks.vega,
            long_vega: spread.long.greeks.vega,
            net_vega: spread.net_vega,
            assumption: spread.spread_type.assumption().to_string(),
        }
    }
}

/// Destination for spread records.
pub trait SpreadSink {
    fn write(&mut self, record: &SpreadRecord) -> Result<(), ExportError>;

    fn finish(&mut self) -> Result<(), ExportError> {
        Ok(())
    }
}

/// CSV sink with the static header row.
pub struct CsvSink<W: io::Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    pub fn create(path: &Path) -> Result<Self, ExportError> {
        Self::from_writer(File::create(path)?)
    }
}

impl<W: io::Write> CsvSink<W> {
    pub fn from_writer(writer: W) -> Result<Self, ExportError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(COLUMNS)?;
        Ok(Self { writer })
    }
}

impl<W: io::Write> SpreadSink for CsvSink<W> {
    fn write(&mut self, record: &SpreadRecord) -> Result<(), ExportError> {
        self.writer.serialize(record)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON-lines sink, one record object per line.
pub struct JsonlSink<W: io::Write> {
    writer: BufWriter<W>,
}

impl JsonlSink<File> {
    pub fn create(path: &Path) -> Result<Self, ExportError> {
        Ok(Self::from_writer(File::create(path)?))
    }
}

impl<W: io::Write> JsonlSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }
}

impl<W: io::Write> SpreadSink for JsonlSink<W> {
    fn write(&mut self, record: &SpreadRecord) -> Result<(), ExportError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Write one scan's records to timestamped CSV and JSON-lines files under
/// `output_dir`, returning the paths written.
pub fn export_records(
    records: &[SpreadRecord],
    output_dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(output_dir)?;
    let stamp = Local::now().format("%Y-%m-%dT%H-%M-%S");

    let csv_path = output_dir.join(format!("spreads-{stamp}.csv"));
    let mut csv_sink = CsvSink::create(&csv_path)?;
    for record in records {
        csv_sink.write(record)?;
    }
    csv_sink.finish()?;

    let jsonl_path = output_dir.join(format!("spreads-{stamp}.jsonl"));
    let mut jsonl_sink = JsonlSink::create(&jsonl_path)?;
    for record in records {
        jsonl_sink.write(record)?;
    }
    jsonl_sink.finish()?;

    Ok(vec![csv_path, jsonl_path])
}
