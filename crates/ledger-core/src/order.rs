//! Order types and the venue order-state machine.

use model::split_trading_pair;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Convert from the venue string representation.
    pub fn from_venue_str(s: &str) -> Option<Self> {
        match s {
            "Buy" => Some(Self::Buy),
            "Sell" => Some(Self::Sell),
            _ => None,
        }
    }

    /// Convert to the venue string representation.
    pub fn as_venue_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    StopMarket,
    StopLimit,
}

impl OrderType {
    /// Convert from the venue string representation.
    pub fn from_venue_str(s: &str) -> Option<Self> {
        match s {
            "Market" => Some(Self::Market),
            "Limit" => Some(Self::Limit),
            "StopMarket" => Some(Self::StopMarket),
            "StopLimit" => Some(Self::StopLimit),
            _ => None,
        }
    }

    /// Convert to the venue string representation.
    pub fn as_venue_str(&self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Limit => "Limit",
            Self::StopMarket => "StopMarket",
            Self::StopLimit => "StopLimit",
        }
    }
}

/// Order state as reported by the venue.
///
/// Partial fills do not change the state; the venue keeps an order in
/// `Working` until it is fully executed, canceled, rejected or expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    /// Order accepted and resting (or filling) on the book.
    Working,
    /// Order completely filled.
    FullyExecuted,
    /// Order canceled by user or venue.
    Canceled,
    /// Order rejected by the venue.
    Rejected,
    /// Order expired.
    Expired,
    /// A state this connector does not recognize (kept verbatim).
    Unknown(String),
}

impl OrderState {
    /// Convert from the venue string representation.
    pub fn from_venue_str(s: &str) -> Self {
        match s {
            "Working" => Self::Working,
            "FullyExecuted" => Self::FullyExecuted,
            "Canceled" => Self::Canceled,
            "Rejected" => Self::Rejected,
            "Expired" => Self::Expired,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The venue string for this state.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Working => "Working",
            Self::FullyExecuted => "FullyExecuted",
            Self::Canceled => "Canceled",
            Self::Rejected => "Rejected",
            Self::Expired => "Expired",
            Self::Unknown(s) => s,
        }
    }

    /// Check if this is a terminal state (order is done).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::FullyExecuted | Self::Canceled | Self::Rejected | Self::Expired
        )
    }

    /// Check if this is a terminal failure (distinct from terminal success).
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Rejected | Self::Expired)
    }
}

/// A locally-submitted order awaiting terminal resolution from the venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InFlightOrder {
    /// Client-assigned order id (ledger key).
    pub client_order_id: String,
    /// Exchange-assigned order id (authoritative once known).
    pub exchange_order_id: String,
    /// Hyphenated trading pair (e.g. "BTC-USD").
    pub trading_pair: String,
    /// Buy or sell.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Requested price.
    pub price: Decimal,
    /// Requested amount in base asset.
    pub amount: Decimal,
    /// Cumulative executed base amount.
    pub executed_amount_base: Decimal,
    /// Cumulative executed quote amount.
    pub executed_amount_quote: Decimal,
    /// Cumulative fee paid.
    pub fee_paid: Decimal,
    /// Asset the fee is charged in.
    pub fee_asset: String,
    /// Venue trade ids already applied to this order.
    pub trade_ids: HashSet<u64>,
    /// Last state observed from the venue.
    pub last_state: OrderState,
}

impl InFlightOrder {
    /// Create a new order in the `Working` state.
    pub fn new(
        client_order_id: String,
        exchange_order_id: String,
        trading_pair: String,
        side: OrderSide,
        price: Decimal,
        amount: Decimal,
        order_type: OrderType,
    ) -> Self {
        let fee_asset = split_trading_pair(&trading_pair)
            .map(|(_, quote)| quote.to_string())
            .unwrap_or_else(|| trading_pair.clone());

        Self {
            client_order_id,
            exchange_order_id,
            trading_pair,
            side,
            order_type,
            price,
            amount,
            executed_amount_base: Decimal::ZERO,
            executed_amount_quote: Decimal::ZERO,
            fee_paid: Decimal::ZERO,
            fee_asset,
            trade_ids: HashSet::new(),
            last_state: OrderState::Working,
        }
    }

    /// Base asset symbol of the trading pair.
    pub fn base_asset(&self) -> &str {
        split_trading_pair(&self.trading_pair)
            .map(|(base, _)| base)
            .unwrap_or(&self.trading_pair)
    }

    /// Quote asset symbol of the trading pair.
    pub fn quote_asset(&self) -> &str {
        split_trading_pair(&self.trading_pair)
            .map(|(_, quote)| quote)
            .unwrap_or(&self.trading_pair)
    }

    /// Amount in base asset still unfilled.
    pub fn remaining_amount(&self) -> Decimal {
        self.amount - self.executed_amount_base
    }

    /// Check if the order reached any terminal state.
    pub fn is_done(&self) -> bool {
        self.last_state.is_terminal()
    }

    /// Check if the order ended in cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.last_state == OrderState::Canceled
    }

    /// Check if the order ended in terminal failure.
    pub fn is_failure(&self) -> bool {
        self.last_state.is_failure()
    }
}
