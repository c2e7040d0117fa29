//! Scheduled scan loop.
//!
//! Re-runs the watchlist scan every `run_frequency_mins` during the run
//! window (weekdays, 09:00-17:00 local). Off-hours it sleeps a minute and
//! checks again.

use std::time::Duration;

use chrono::{Datelike, Local, Timelike};
use tracing::info;

use crate::config::Params;
use crate::data::ChainClient;
use crate::export::{self, ExportError};
use crate::scanner::{Scanner, Watchlist};

/// Weekdays between 09:00 and 17:00.
fn in_run_window<T: Datelike + Timelike>(now: &T) -> bool {
    now.weekday().num_days_from_monday() < 5 && (9..17).contains(&now.hour())
}

/// Run the scan daemon until the process is stopped.
pub async fn run(params: &Params) -> Result<(), ExportError> {
    let mut client = ChainClient::new(&params.api.base_url, &params.api.token);
    let scanner = Scanner::new(params.criteria(), params.search_days);
    let frequency = Duration::from_secs(params.run_frequency_mins * 60);

    info!(
        frequency_mins = params.run_frequency_mins,
        "starting scan daemon"
    );

    loop {
        if !in_run_window(&Local::now()) {
            tokio::time::sleep(Duration::from_secs(60)).await;
            continue;
        }

        // re-read each run so watchlist edits take effect without a restart
        let watchlist = Watchlist::from_file(&params.watchlist)?;
        let outcome = scanner.run(&mut client, &watchlist).await;
        let paths = export::export_records(&outcome.records, &params.output_dir)?;

        info!(
            symbols = outcome.symbols_scanned,
            failed = outcome.symbols_failed,
            spreads = outcome.records.len(),
            files = paths.len(),
            "scan complete, pausing {} minutes",
            params.run_frequency_mins
        );

        tokio::time::sleep(frequency).await;
    }
}
