//! Per-asset balance ledger.
//!
//! Updated from two sources with overwrite semantics: account-position
//! events on the user stream and REST balance snapshots. A report is
//! authoritative for its asset at that instant; assets it does not mention
//! are left untouched.

use dashmap::DashMap;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by the balance ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The asset has never been reported by the venue.
    #[error("Balance for asset '{0}' has never been reported")]
    AssetNotFound(String),
}

/// Total and available balance for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceEntry {
    /// Total balance, including amounts held against open orders.
    pub total: Decimal,
    /// Balance available for new orders (total minus hold).
    pub available: Decimal,
}

/// One asset position as reported by a REST balances snapshot.
#[derive(Debug, Clone)]
pub struct AssetPosition {
    pub asset: String,
    pub total: Decimal,
    pub hold: Decimal,
}

/// Thread-safe balance ledger keyed by asset symbol.
#[derive(Debug, Default)]
pub struct BalanceLedger {
    balances: DashMap<String, BalanceEntry>,
}

impl BalanceLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a single account-position report.
    ///
    /// Overwrite semantics: total becomes `amount`, available becomes
    /// `amount - hold`.
    pub fn apply_account_position(&self, asset: &str, amount: Decimal, hold: Decimal) {
        self.balances.insert(
            asset.to_string(),
            BalanceEntry {
                total: amount,
                available: amount - hold,
            },
        );
    }

    /// Apply a REST balances snapshot.
    ///
    /// Each reported asset is overwritten; assets absent from the snapshot
    /// keep their previous values (the snapshot is partial-assets, not a
    /// full replace).
    pub fn reconcile_from_snapshot(&self, positions: &[AssetPosition]) {
        for position in positions {
            self.apply_account_position(&position.asset, position.total, position.hold);
        }
    }

    /// Total balance for an asset.
    pub fn get_balance(&self, asset: &str) -> Result<Decimal, LedgerError> {
        self.balances
            .get(asset)
            .map(|entry| entry.total)
            .ok_or_else(|| LedgerError::AssetNotFound(asset.to_string()))
    }

    /// Available balance for an asset.
    pub fn get_available_balance(&self, asset: &str) -> Result<Decimal, LedgerError> {
        self.balances
            .get(asset)
            .map(|entry| entry.available)
            .ok_or_else(|| LedgerError::AssetNotFound(asset.to_string()))
    }

    /// Number of assets ever reported.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Whether any asset has been reported.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}
