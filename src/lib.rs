pub mod analytics;
pub mod config;
pub mod daemon;
pub mod data;
pub mod export;
pub mod instrument;
pub mod scanner;

// Re-export commonly used types
pub use analytics::{AcceptanceCriteria, ExpirationSpreads, Spread, SpreadBuilder, SpreadType};
pub use config::{ConfigError, Params};
pub use data::{ChainClient, ChainError, ExpirationDate, OptionChain, PutCall, Strike};
pub use export::{CsvSink, ExportError, JsonlSink, SpreadRecord, SpreadSink, COLUMNS};
pub use instrument::Instrument;
pub use scanner::{ScanOutcome, Scanner, Watchlist};
