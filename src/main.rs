//! # Scan a watchlist once
//! spreadhunt scan --params parameters.json
//!
//! # Re-run on the configured schedule during market hours
//! spreadhunt daemon --params parameters.json

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use spreadhunt::config::Params;
use spreadhunt::daemon;
use spreadhunt::data::ChainClient;
use spreadhunt::export;
use spreadhunt::scanner::{Scanner, Watchlist};

#[derive(Parser)]
#[command(name = "spreadhunt")]
#[command(about = "Vertical credit-spread screener for option chains")]
#[command(version)]
struct Cli {
    /// Path to the parameters file
    #[arg(short, long, default_value = "parameters.json")]
    params: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scan over the watchlist and export the results
    Scan {
        /// Log the summary without writing output files
        #[arg(long)]
        dry_run: bool,
    },

    /// Run scans continuously on the configured schedule
    Daemon,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("spreadhunt=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let params = Params::load(&cli.params)
        .with_context(|| format!("loading parameters from {}", cli.params.display()))?;

    match cli.command {
        Commands::Scan { dry_run } => {
            let watchlist = Watchlist::from_file(&params.watchlist)
                .with_context(|| format!("reading watchlist {}", params.watchlist.display()))?;
            info!(
                watchlist = %watchlist.name,
                symbols = watchlist.symbols.len(),
                "starting scan"
            );

            let mut client = ChainClient::new(&params.api.base_url, &params.api.token);
            let scanner = Scanner::new(params.criteria(), params.search_days);
            let outcome = scanner.run(&mut client, &watchlist).await;

            println!(
                "Scanned {} symbols ({} failed)",
                outcome.symbols_scanned, outcome.symbols_failed
            );
            println!(
                "{} candidate pairings, {} acceptable spreads",
                outcome.candidates,
                outcome.records.len()
            );

            if !dry_run {
                let paths = export::export_records(&outcome.records, &params.output_dir)
                    .context("exporting records")?;
                for path in paths {
                    println!("Wrote {}", path.display());
                }
            }
        }

        Commands::Daemon => {
            daemon::run(&params).await.context("scan daemon failed")?;
        }
    }

    Ok(())
}
