//! Lifecycle events derived from ledger state transitions.
//!
//! Events are delivered over an unbounded channel so that emission never
//! blocks a ledger mutation. Consumers (strategy/supervisor layer) receive
//! them in emission order.

use crate::order::{OrderSide, OrderType};
use rust_decimal::Decimal;
use tokio::sync::mpsc;

/// Estimated trading fee as a fraction, used when the venue does not report
/// the fee on the trade event itself.
pub fn estimated_fee_percent() -> Decimal {
    // 0.02
    Decimal::new(2, 2)
}

/// Fee attached to a fill event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeFee {
    /// Percentage fee as a fraction of the traded amount.
    pub percent: Decimal,
    /// Flat fees as (asset, amount) pairs.
    pub flat_fees: Vec<(String, Decimal)>,
}

impl TradeFee {
    /// A purely percentage-based fee.
    pub fn percent_only(percent: Decimal) -> Self {
        Self {
            percent,
            flat_fees: Vec::new(),
        }
    }
}

/// A single fill applied to a tracked order.
#[derive(Debug, Clone)]
pub struct OrderFilledEvent {
    pub order_id: String,
    pub trading_pair: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    /// Fill price.
    pub price: Decimal,
    /// Fill amount in base asset.
    pub amount: Decimal,
    pub fee: TradeFee,
    /// Venue trade id, stringified.
    pub exchange_trade_id: String,
}

/// A tracked order was canceled at the venue.
#[derive(Debug, Clone)]
pub struct OrderCancelledEvent {
    pub order_id: String,
}

/// A tracked order failed terminally (rejected or expired).
#[derive(Debug, Clone)]
pub struct MarketOrderFailureEvent {
    pub order_id: String,
    pub order_type: OrderType,
    /// Venue-reported reason for the failure.
    pub reason: String,
}

/// A tracked order was completely filled.
#[derive(Debug, Clone)]
pub struct OrderCompletedEvent {
    pub order_id: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub fee_asset: String,
    /// Total executed base amount.
    pub base_asset_amount: Decimal,
    /// Total executed quote amount.
    pub quote_asset_amount: Decimal,
    /// Total fee paid over the order's lifetime.
    pub fee_amount: Decimal,
    pub order_type: OrderType,
    pub exchange_order_id: String,
}

/// Externally observable order lifecycle notifications.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    OrderFilled(OrderFilledEvent),
    OrderCancelled(OrderCancelledEvent),
    MarketOrderFailure(MarketOrderFailureEvent),
    BuyOrderCompleted(OrderCompletedEvent),
    SellOrderCompleted(OrderCompletedEvent),
}

pub type LifecycleEventSender = mpsc::UnboundedSender<LifecycleEvent>;
pub type LifecycleEventReceiver = mpsc::UnboundedReceiver<LifecycleEvent>;

/// Create the lifecycle event channel.
pub fn create_lifecycle_channel() -> (LifecycleEventSender, LifecycleEventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_estimated_fee_percent() {
        assert_eq!(estimated_fee_percent(), dec!(0.02));
    }

    #[test]
    fn test_percent_only_fee() {
        let fee = TradeFee::percent_only(dec!(0.02));
        assert_eq!(fee.percent, dec!(0.02));
        assert!(fee.flat_fees.is_empty());
    }
}
