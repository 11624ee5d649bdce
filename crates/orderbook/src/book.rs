//! Order book with sorted price levels.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::level::PriceLevel;

/// Which side of the book a level belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Bid,
    Ask,
}

/// Local order book maintaining sorted bid and ask levels.
///
/// Uses `BTreeMap` with `Decimal` keys so price levels never lose precision.
/// Bids are keyed with `Reverse<Decimal>` so iteration yields the highest
/// price first; asks iterate lowest first.
#[derive(Debug, Clone)]
pub struct OrderBook {
    trading_pair: String,
    bids: BTreeMap<Reverse<Decimal>, Decimal>,
    asks: BTreeMap<Decimal, Decimal>,
    /// Venue sequence number of the last applied update.
    last_update_id: Option<u64>,
}

impl OrderBook {
    /// Creates a new empty order book for the given trading pair.
    pub fn new(trading_pair: impl Into<String>) -> Self {
        Self {
            trading_pair: trading_pair.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            last_update_id: None,
        }
    }

    /// Returns the trading pair this order book tracks.
    pub fn trading_pair(&self) -> &str {
        &self.trading_pair
    }

    /// Returns the sequence number of the last applied update.
    pub fn last_update_id(&self) -> Option<u64> {
        self.last_update_id
    }

    /// Applies a full snapshot, replacing all existing levels.
    pub fn apply_snapshot(
        &mut self,
        bids: &[(Decimal, Decimal)],
        asks: &[(Decimal, Decimal)],
        update_id: u64,
    ) {
        self.bids.clear();
        self.asks.clear();

        for (price, quantity) in bids {
            if !quantity.is_zero() {
                self.bids.insert(Reverse(*price), *quantity);
            }
        }

        for (price, quantity) in asks {
            if !quantity.is_zero() {
                self.asks.insert(*price, *quantity);
            }
        }

        self.last_update_id = Some(update_id);
    }

    /// Upserts a single price level; a zero quantity deletes the level.
    pub fn apply_level(&mut self, side: BookSide, price: Decimal, quantity: Decimal, update_id: u64) {
        match side {
            BookSide::Bid => {
                if quantity.is_zero() {
                    self.bids.remove(&Reverse(price));
                } else {
                    self.bids.insert(Reverse(price), quantity);
                }
            }
            BookSide::Ask => {
                if quantity.is_zero() {
                    self.asks.remove(&price);
                } else {
                    self.asks.insert(price, quantity);
                }
            }
        }
        self.last_update_id = Some(update_id);
    }

    /// Returns the best (highest) bid price level.
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids
            .iter()
            .next()
            .map(|(Reverse(price), qty)| PriceLevel::new(*price, *qty))
    }

    /// Returns the best (lowest) ask price level.
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks
            .iter()
            .next()
            .map(|(price, qty)| PriceLevel::new(*price, *qty))
    }

    /// Returns the mid price (average of best bid and best ask).
    pub fn mid_price(&self) -> Option<Decimal> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Some((bid.price + ask.price) / Decimal::TWO)
    }

    /// Returns the spread (best ask - best bid).
    pub fn spread(&self) -> Option<Decimal> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Some(ask.price - bid.price)
    }

    /// Returns the top N bid price levels (highest to lowest).
    pub fn top_bids(&self, n: usize) -> Vec<PriceLevel> {
        self.bids
            .iter()
            .take(n)
            .map(|(Reverse(price), qty)| PriceLevel::new(*price, *qty))
            .collect()
    }

    /// Returns the top N ask price levels (lowest to highest).
    pub fn top_asks(&self, n: usize) -> Vec<PriceLevel> {
        self.asks
            .iter()
            .take(n)
            .map(|(price, qty)| PriceLevel::new(*price, *qty))
            .collect()
    }

    /// Returns the total number of bid levels.
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Returns the total number of ask levels.
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_book() {
        let book = OrderBook::new("BTC-USD");
        assert_eq!(book.trading_pair(), "BTC-USD");
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
        assert!(book.mid_price().is_none());
        assert!(book.last_update_id().is_none());
    }

    #[test]
    fn test_apply_snapshot() {
        let mut book = OrderBook::new("BTC-USD");

        let bids = vec![(dec!(100.0), dec!(1.0)), (dec!(99.0), dec!(2.0))];
        let asks = vec![(dec!(101.0), dec!(1.5)), (dec!(102.0), dec!(2.5))];
        book.apply_snapshot(&bids, &asks, 1000);

        assert_eq!(book.last_update_id(), Some(1000));
        assert_eq!(book.best_bid().unwrap().price, dec!(100.0));
        assert_eq!(book.best_ask().unwrap().price, dec!(101.0));
        assert_eq!(book.mid_price(), Some(dec!(100.5)));
        assert_eq!(book.spread(), Some(dec!(1.0)));
    }

    #[test]
    fn test_snapshot_replaces_levels() {
        let mut book = OrderBook::new("BTC-USD");

        book.apply_snapshot(&[(dec!(100.0), dec!(1.0))], &[(dec!(101.0), dec!(1.0))], 1);
        book.apply_snapshot(&[(dec!(90.0), dec!(1.0))], &[], 2);

        assert_eq!(book.best_bid().unwrap().price, dec!(90.0));
        assert!(book.best_ask().is_none());
        assert_eq!(book.last_update_id(), Some(2));
    }

    #[test]
    fn test_apply_level_upsert_and_delete() {
        let mut book = OrderBook::new("BTC-USD");
        book.apply_snapshot(
            &[(dec!(100.0), dec!(1.0)), (dec!(99.0), dec!(2.0))],
            &[(dec!(101.0), dec!(1.0))],
            1,
        );

        book.apply_level(BookSide::Bid, dec!(100.0), dec!(3.0), 2);
        assert_eq!(book.best_bid().unwrap().quantity, dec!(3.0));

        // Zero quantity removes the level
        book.apply_level(BookSide::Bid, dec!(100.0), dec!(0), 3);
        assert_eq!(book.best_bid().unwrap().price, dec!(99.0));
        assert_eq!(book.bid_levels(), 1);
        assert_eq!(book.last_update_id(), Some(3));
    }

    #[test]
    fn test_top_levels_ordering() {
        let mut book = OrderBook::new("BTC-USD");
        book.apply_snapshot(
            &[
                (dec!(98.0), dec!(3.0)),
                (dec!(100.0), dec!(1.0)),
                (dec!(99.0), dec!(2.0)),
            ],
            &[
                (dec!(103.0), dec!(3.5)),
                (dec!(101.0), dec!(1.5)),
                (dec!(102.0), dec!(2.5)),
            ],
            1,
        );

        let top_bids = book.top_bids(2);
        assert_eq!(top_bids[0].price, dec!(100.0));
        assert_eq!(top_bids[1].price, dec!(99.0));

        let top_asks = book.top_asks(2);
        assert_eq!(top_asks[0].price, dec!(101.0));
        assert_eq!(top_asks[1].price, dec!(102.0));
    }

    #[test]
    fn test_high_precision_prices_stay_distinct() {
        let mut book = OrderBook::new("BTC-USD");

        let price1 = dec!(0.00000001);
        let price2 = dec!(0.00000002);
        book.apply_snapshot(&[(price2, dec!(2.0)), (price1, dec!(1.0))], &[], 1);

        assert_eq!(book.bid_levels(), 2);
        assert_eq!(book.top_bids(2)[0].price, price2);
        assert_eq!(book.top_bids(2)[1].price, price1);
    }
}
