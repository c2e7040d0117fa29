//! Spread construction and scoring.
//!
//! Provides:
//! - Combinatorial vertical-spread enumeration and leg classification
//! - Derived trade metrics and the acceptance filter
//! - The aggregate desirability score

pub mod scoring;
pub mod spreads;

pub use spreads::{AcceptanceCriteria, ExpirationSpreads, Spread, SpreadBuilder, SpreadType};
