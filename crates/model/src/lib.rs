//! Shared market model types for the NDAX connector.

mod instrument;

pub use instrument::{split_trading_pair, Instrument, InstrumentRegistry};

use serde::{Deserialize, Serialize};

/// Result of a venue connectivity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkStatus {
    /// The venue answered the health check with the expected acknowledgement.
    Connected,
    /// The venue was unreachable or answered with anything unexpected.
    NotConnected,
}

impl std::fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkStatus::Connected => write!(f, "CONNECTED"),
            NetworkStatus::NotConnected => write!(f, "NOT_CONNECTED"),
        }
    }
}
