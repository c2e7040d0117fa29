//! Watchlist scan: many symbols through the spread engine.
//!
//! Chain fetches run sequentially behind the client's rate limit; a failed
//! symbol is logged and skipped so the rest of the batch completes.
//! Analysis of the fetched instruments is pure and fans out per instrument.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::analytics::{AcceptanceCriteria, ExpirationSpreads, SpreadBuilder};
use crate::data::{ChainClient, OptionChain};
use crate::export::SpreadRecord;
use crate::instrument::Instrument;

/// Symbols to scan, from a local watchlist file.
#[derive(Debug, Clone)]
pub struct Watchlist {
    pub name: String,
    pub symbols: Vec<String>,
}

impl Watchlist {
    /// Load a watchlist: one symbol per line, blank lines and `#` comments
    /// skipped.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;

        let mut symbols = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let symbol = line.trim();
            if symbol.is_empty() || symbol.starts_with('#') {
                continue;
            }
            symbols.push(symbol.to_uppercase());
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "watchlist".to_string());

        Ok(Self { name, symbols })
    }
}

/// Results of one scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Accepted spreads, flattened in watchlist order.
    pub records: Vec<SpreadRecord>,

    pub symbols_scanned: usize,
    pub symbols_failed: usize,

    /// Raw pairings enumerated before filtering.
    pub candidates: usize,
}

/// Runs the spread engine across a watchlist.
pub struct Scanner {
    builder: SpreadBuilder,
    horizon_days: i64,
}

impl Scanner {
    pub fn new(criteria: AcceptanceCriteria, horizon_days: i64) -> Self {
        Self {
            builder: SpreadBuilder::new(criteria),
            horizon_days,
        }
    }

    /// Fetch chains for every watchlist symbol, then analyze them.
    pub async fn run(&self, client: &mut ChainClient, watchlist: &Watchlist) -> ScanOutcome {
        let bar = ProgressBar::new(watchlist.symbols.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut instruments = Vec::new();
        let mut failed = 0;

        for symbol in &watchlist.symbols {
            bar.set_message(symbol.clone());

            match client.get_option_chain(symbol, self.horizon_days).await {
                Ok(raw) => match OptionChain::from_raw(&raw, self.horizon_days) {
                    Ok(chain) => instruments.push(Instrument::new(chain)),
                    Err(error) => {
                        warn!(%symbol, %error, "skipping symbol: bad chain document");
                        failed += 1;
                    }
                },
                Err(error) => {
                    warn!(%symbol, %error, "skipping symbol: chain fetch failed");
                    failed += 1;
                }
            }

            bar.inc(1);
        }
        bar.finish_and_clear();

        let mut outcome = self.analyze(&instruments);
        outcome.symbols_scanned = watchlist.symbols.len();
        outcome.symbols_failed = failed;
        outcome
    }

    /// Analyze already-fetched instruments. No shared state across
    /// instruments, so the fan-out needs no locking.
    pub fn analyze(&self, instruments: &[Instrument]) -> ScanOutcome {
        type Analyzed = (Vec<ExpirationSpreads>, Vec<ExpirationSpreads>);

        let analyzed: Vec<Analyzed> = instruments
            .par_iter()
            .map(|instrument| {
                (
                    instrument.analyze_put_spreads(&self.builder),
                    instrument.analyze_call_spreads(&self.builder),
                )
            })
            .collect();

        let mut outcome = ScanOutcome {
            symbols_scanned: instruments.len(),
            ..ScanOutcome::default()
        };

        // collect() kept instrument order, so output order is watchlist order
        for (puts, calls) in &analyzed {
            for bucket in puts.iter().chain(calls.iter()) {
                outcome.candidates += bucket.candidates;
                outcome
                    .records
                    .extend(bucket.spreads.iter().map(SpreadRecord::from));
            }
        }

        info!(
            spreads = outcome.records.len(),
            candidates = outcome.candidates,
            "scan analysis complete"
        );

        outcome
    }
}
