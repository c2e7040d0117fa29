//! Chain data layer.
//!
//! `raw` mirrors the brokerage payload, `types`/`chain` are the sanitized
//! model the engine consumes, and `client` fetches one symbol's document.

pub mod chain;
pub mod client;
pub mod raw;
pub mod types;

pub use chain::{ExpirationDate, OptionChain, SearchField};
pub use client::{ChainClient, ClientError};
pub use raw::{RawContract, RawOptionChain, RawUnderlying};
pub use types::{ChainError, Greeks, PutCall, RawGreeks, Strike, UnderlyingQuote};
