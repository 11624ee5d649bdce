//! Instrument metadata and symbol mapping.
//!
//! The venue identifies markets by numeric instrument id, while callers use
//! hyphenated trading pairs (e.g. "BTC-USD"). This module maps between the
//! two and exposes base/quote asset symbols per pair.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Split a hyphenated trading pair into base and quote asset symbols.
pub fn split_trading_pair(trading_pair: &str) -> Option<(&str, &str)> {
    trading_pair.split_once('-')
}

/// A tradable instrument as reported by the venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    /// Venue-assigned numeric instrument id.
    pub instrument_id: i64,
    /// Hyphenated trading pair (e.g. "BTC-USD").
    pub trading_pair: String,
    /// Base asset symbol.
    pub base: String,
    /// Quote asset symbol.
    pub quote: String,
    /// Minimum order quantity, if published by the venue.
    pub min_quantity: Option<Decimal>,
    /// Price increment, if published by the venue.
    pub price_increment: Option<Decimal>,
}

impl Instrument {
    /// Create an instrument from a trading pair, deriving base and quote.
    ///
    /// Returns `None` when the pair is not hyphenated.
    pub fn from_trading_pair(instrument_id: i64, trading_pair: &str) -> Option<Self> {
        let (base, quote) = split_trading_pair(trading_pair)?;
        Some(Self {
            instrument_id,
            trading_pair: trading_pair.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
            min_quantity: None,
            price_increment: None,
        })
    }
}

/// Lookup table mapping instrument ids and trading pairs to instruments.
#[derive(Debug, Default)]
pub struct InstrumentRegistry {
    by_id: HashMap<i64, Instrument>,
    by_pair: HashMap<String, Instrument>,
}

impl InstrumentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of instruments.
    pub fn from_instruments(instruments: Vec<Instrument>) -> Self {
        let mut registry = Self::new();
        for instrument in instruments {
            registry.insert(instrument);
        }
        registry
    }

    /// Register an instrument, replacing any previous entry for the same id
    /// or pair.
    pub fn insert(&mut self, instrument: Instrument) {
        self.by_pair
            .insert(instrument.trading_pair.clone(), instrument.clone());
        self.by_id.insert(instrument.instrument_id, instrument);
    }

    /// Look up an instrument by trading pair.
    pub fn get_by_pair(&self, trading_pair: &str) -> Option<&Instrument> {
        self.by_pair.get(trading_pair)
    }

    /// Look up an instrument by venue instrument id.
    pub fn get_by_id(&self, instrument_id: i64) -> Option<&Instrument> {
        self.by_id.get(&instrument_id)
    }

    /// All registered trading pairs.
    pub fn trading_pairs(&self) -> Vec<String> {
        self.by_pair.keys().cloned().collect()
    }

    /// Number of registered instruments.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
