//! Local order book for market depth tracking.
//!
//! The connector core only registers books per trading pair and serves them
//! to callers; the depth data source owns keeping them up to date via
//! [`OrderBook::apply_snapshot`] and [`OrderBook::apply_level`].
//!
//! # Example
//!
//! ```rust
//! use orderbook::OrderBook;
//! use rust_decimal_macros::dec;
//!
//! let mut book = OrderBook::new("BTC-USD");
//!
//! let bids = vec![(dec!(100.0), dec!(1.0)), (dec!(99.0), dec!(2.0))];
//! let asks = vec![(dec!(101.0), dec!(1.5)), (dec!(102.0), dec!(2.5))];
//! book.apply_snapshot(&bids, &asks, 1000);
//!
//! assert_eq!(book.best_bid().unwrap().price, dec!(100.0));
//! assert_eq!(book.mid_price(), Some(dec!(100.5)));
//! ```

mod book;
mod level;

pub use book::{BookSide, OrderBook};
pub use level::PriceLevel;
