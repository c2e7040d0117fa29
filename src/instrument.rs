//! One underlying under analysis.

use crate::analytics::{ExpirationSpreads, SpreadBuilder, SpreadType};
use crate::data::{OptionChain, UnderlyingQuote};

/// An underlying with its option chain, ready to screen.
#[derive(Debug, Clone)]
pub struct Instrument {
    pub symbol: String,
    pub chain: OptionChain,
}

impl Instrument {
    pub fn new(chain: OptionChain) -> Self {
        Self {
            symbol: chain.symbol.clone(),
            chain,
        }
    }

    /// Underlying quote snapshot taken with the chain.
    pub fn quote(&self) -> UnderlyingQuote {
        self.chain.underlying
    }

    /// Put credit spreads per expiration.
    pub fn analyze_put_spreads(&self, builder: &SpreadBuilder) -> Vec<ExpirationSpreads> {
        builder.analyze(&self.chain, SpreadType::PutCredit)
    }

    /// Call credit spreads per expiration.
    pub fn analyze_call_spreads(&self, builder: &SpreadBuilder) -> Vec<ExpirationSpreads> {
        builder.analyze(&self.chain, SpreadType::CallCredit)
    }
}
