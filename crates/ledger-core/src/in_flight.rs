//! The in-flight order ledger.
//!
//! Authoritative mutable record of each locally-submitted order and its
//! fill/cancel/reject progress. All mutation goes through this type; the
//! write lock serializes the user-stream dispatcher against the REST
//! reconciliation path.

use crate::events::{
    estimated_fee_percent, LifecycleEvent, LifecycleEventSender, MarketOrderFailureEvent,
    OrderCancelledEvent, OrderCompletedEvent, OrderFilledEvent, TradeFee,
};
use crate::order::{InFlightOrder, OrderSide, OrderState, OrderType};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Ledger of in-flight orders keyed by client order id.
///
/// An order leaves the ledger exactly once, when it first reaches a terminal
/// state, and only after its terminal lifecycle event has been emitted.
pub struct InFlightOrderLedger {
    orders: RwLock<HashMap<String, InFlightOrder>>,
    events: LifecycleEventSender,
}

impl InFlightOrderLedger {
    /// Create an empty ledger emitting lifecycle events on the given channel.
    pub fn new(events: LifecycleEventSender) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Begin tracking a newly submitted order in the `Working` state.
    ///
    /// A duplicate client order id is a logged no-op: the existing record is
    /// authoritative.
    #[allow(clippy::too_many_arguments)]
    pub fn start_tracking(
        &self,
        client_order_id: &str,
        exchange_order_id: &str,
        trading_pair: &str,
        side: OrderSide,
        price: Decimal,
        amount: Decimal,
        order_type: OrderType,
    ) {
        let mut orders = self.orders.write();
        if orders.contains_key(client_order_id) {
            warn!(
                client_order_id = %client_order_id,
                "Order is already being tracked, ignoring"
            );
            return;
        }

        orders.insert(
            client_order_id.to_string(),
            InFlightOrder::new(
                client_order_id.to_string(),
                exchange_order_id.to_string(),
                trading_pair.to_string(),
                side,
                price,
                amount,
                order_type,
            ),
        );
    }

    /// Stop tracking an order without emitting any event.
    ///
    /// Returns the removed order, if it was tracked.
    pub fn stop_tracking(&self, client_order_id: &str) -> Option<InFlightOrder> {
        self.orders.write().remove(client_order_id)
    }

    /// Apply an order-state event from the user stream.
    ///
    /// Events for orders not tracked locally are ignored. Cancellation and
    /// terminal failure remove the order and emit the matching lifecycle
    /// event; every other state only updates `last_state`.
    pub fn apply_order_state(&self, client_order_id: &str, state: OrderState, change_reason: &str) {
        let mut orders = self.orders.write();
        let Some(order) = orders.get_mut(client_order_id) else {
            debug!(
                client_order_id = %client_order_id,
                "Order state event for untracked order, ignoring"
            );
            return;
        };

        order.last_state = state.clone();

        if state == OrderState::Canceled {
            let order = orders
                .remove(client_order_id)
                .expect("order present under write lock");
            info!("Successfully cancelled order {}", order.client_order_id);
            self.emit(LifecycleEvent::OrderCancelled(OrderCancelledEvent {
                order_id: order.client_order_id,
            }));
        } else if state.is_failure() {
            let order = orders
                .remove(client_order_id)
                .expect("order present under write lock");
            info!(
                "The market order {} has failed according to order status event. Reason: {}",
                order.client_order_id, change_reason
            );
            self.emit(LifecycleEvent::MarketOrderFailure(MarketOrderFailureEvent {
                order_id: order.client_order_id,
                order_type: order.order_type,
                reason: change_reason.to_string(),
            }));
        }
    }

    /// Apply a trade (fill) event from the user stream.
    ///
    /// A trade id already applied to the order is a no-op, which makes stream
    /// replay after a reconnect safe. A fill that brings the cumulative
    /// executed base amount up to the requested amount completes the order:
    /// it is removed and a completion event follows the fill event.
    pub fn apply_trade_fill(
        &self,
        client_order_id: &str,
        trade_id: u64,
        quantity: Decimal,
        price: Decimal,
    ) {
        let mut orders = self.orders.write();
        let Some(order) = orders.get_mut(client_order_id) else {
            debug!(
                client_order_id = %client_order_id,
                trade_id = trade_id,
                "Trade event for untracked order, ignoring"
            );
            return;
        };

        if !order.trade_ids.insert(trade_id) {
            debug!(
                client_order_id = %client_order_id,
                trade_id = trade_id,
                "Trade already applied, ignoring duplicate"
            );
            return;
        }

        order.executed_amount_base += quantity;
        order.executed_amount_quote += quantity * price;

        // The venue does not report fees on trade events; accrue the
        // estimated fee. Buys are charged on the base amount, sells on
        // base times quote, mirroring the venue's observed behavior.
        let fee_percent = estimated_fee_percent();
        order.fee_paid += match order.side {
            OrderSide::Buy => order.executed_amount_base * fee_percent,
            OrderSide::Sell => {
                order.executed_amount_base * order.executed_amount_quote * fee_percent
            }
        };

        self.emit(LifecycleEvent::OrderFilled(OrderFilledEvent {
            order_id: order.client_order_id.clone(),
            trading_pair: order.trading_pair.clone(),
            side: order.side,
            order_type: order.order_type,
            price,
            amount: quantity,
            fee: TradeFee::percent_only(fee_percent),
            exchange_trade_id: trade_id.to_string(),
        }));

        if order.executed_amount_base >= order.amount {
            order.last_state = OrderState::FullyExecuted;
            let order = orders
                .remove(client_order_id)
                .expect("order present under write lock");
            info!(
                "The {} order {} has completed according to order status API",
                order.side, order.client_order_id
            );

            let completed = OrderCompletedEvent {
                order_id: order.client_order_id.clone(),
                base_asset: order.base_asset().to_string(),
                quote_asset: order.quote_asset().to_string(),
                fee_asset: order.fee_asset.clone(),
                base_asset_amount: order.executed_amount_base,
                quote_asset_amount: order.executed_amount_quote,
                fee_amount: order.fee_paid,
                order_type: order.order_type,
                exchange_order_id: order.exchange_order_id.clone(),
            };
            self.emit(match order.side {
                OrderSide::Buy => LifecycleEvent::BuyOrderCompleted(completed),
                OrderSide::Sell => LifecycleEvent::SellOrderCompleted(completed),
            });
        }
    }

    /// Snapshot of a tracked order, if present.
    pub fn get(&self, client_order_id: &str) -> Option<InFlightOrder> {
        self.orders.read().get(client_order_id).cloned()
    }

    /// Client order ids of all tracked orders.
    pub fn client_order_ids(&self) -> Vec<String> {
        self.orders.read().keys().cloned().collect()
    }

    /// Number of tracked orders.
    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    /// Whether no orders are tracked.
    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }

    fn emit(&self, event: LifecycleEvent) {
        if self.events.send(event).is_err() {
            debug!("Lifecycle event receiver dropped, event discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::create_lifecycle_channel;
    use crate::events::LifecycleEventReceiver;
    use rust_decimal_macros::dec;

    fn ledger() -> (InFlightOrderLedger, LifecycleEventReceiver) {
        let (tx, rx) = create_lifecycle_channel();
        (InFlightOrderLedger::new(tx), rx)
    }

    fn track_order(ledger: &InFlightOrderLedger, side: OrderSide, amount: Decimal) {
        ledger.start_tracking(
            "3",
            "9848",
            "BTC-USD",
            side,
            dec!(35000),
            amount,
            OrderType::Limit,
        );
    }

    fn drain(rx: &mut LifecycleEventReceiver) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_start_tracking_inserts_working_order() {
        let (ledger, _rx) = ledger();
        track_order(&ledger, OrderSide::Buy, dec!(1));

        let order = ledger.get("3").unwrap();
        assert_eq!(order.exchange_order_id, "9848");
        assert_eq!(order.last_state, OrderState::Working);
        assert_eq!(order.executed_amount_base, Decimal::ZERO);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_start_tracking_duplicate_is_noop() {
        let (ledger, _rx) = ledger();
        track_order(&ledger, OrderSide::Buy, dec!(1));
        ledger.start_tracking(
            "3",
            "9999",
            "ETH-USD",
            OrderSide::Sell,
            dec!(1),
            dec!(5),
            OrderType::Market,
        );

        // The original record wins
        let order = ledger.get("3").unwrap();
        assert_eq!(order.exchange_order_id, "9848");
        assert_eq!(order.trading_pair, "BTC-USD");
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_stop_tracking_emits_nothing() {
        let (ledger, mut rx) = ledger();
        track_order(&ledger, OrderSide::Buy, dec!(1));

        let removed = ledger.stop_tracking("3").unwrap();
        assert_eq!(removed.client_order_id, "3");
        assert!(ledger.is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_cancel_event_removes_order_and_emits() {
        let (ledger, mut rx) = ledger();
        track_order(&ledger, OrderSide::Sell, dec!(1));

        ledger.apply_order_state("3", OrderState::Canceled, "UserModified");

        assert!(ledger.get("3").is_none());
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            LifecycleEvent::OrderCancelled(evt) => assert_eq!(evt.order_id, "3"),
            other => panic!("expected OrderCancelled, got {:?}", other),
        }
    }

    #[test]
    fn test_rejected_event_removes_order_and_emits_failure() {
        let (ledger, mut rx) = ledger();
        track_order(&ledger, OrderSide::Sell, dec!(1));

        ledger.apply_order_state("3", OrderState::Rejected, "OtherRejected");

        assert!(ledger.get("3").is_none());
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            LifecycleEvent::MarketOrderFailure(evt) => {
                assert_eq!(evt.order_id, "3");
                assert_eq!(evt.reason, "OtherRejected");
                assert_eq!(evt.order_type, OrderType::Limit);
            }
            other => panic!("expected MarketOrderFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_nonterminal_state_only_updates_last_state() {
        let (ledger, mut rx) = ledger();
        track_order(&ledger, OrderSide::Buy, dec!(1));

        ledger.apply_order_state("3", OrderState::Working, "NewInputAccepted");

        let order = ledger.get("3").unwrap();
        assert_eq!(order.last_state, OrderState::Working);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_state_event_for_untracked_order_ignored() {
        let (ledger, mut rx) = ledger();

        ledger.apply_order_state("404", OrderState::Canceled, "UserModified");

        assert!(ledger.is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_buy_fill_completes_order() {
        let (ledger, mut rx) = ledger();
        track_order(&ledger, OrderSide::Buy, dec!(1));

        ledger.apply_trade_fill("3", 213, dec!(1), dec!(35000));

        assert!(ledger.get("3").is_none());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        match &events[0] {
            LifecycleEvent::OrderFilled(evt) => {
                assert_eq!(evt.order_id, "3");
                assert_eq!(evt.trading_pair, "BTC-USD");
                assert_eq!(evt.side, OrderSide::Buy);
                assert_eq!(evt.order_type, OrderType::Limit);
                assert_eq!(evt.price, dec!(35000));
                assert_eq!(evt.amount, dec!(1));
                assert_eq!(evt.fee.percent, dec!(0.02));
                assert!(evt.fee.flat_fees.is_empty());
                assert_eq!(evt.exchange_trade_id, "213");
            }
            other => panic!("expected OrderFilled, got {:?}", other),
        }
        match &events[1] {
            LifecycleEvent::BuyOrderCompleted(evt) => {
                assert_eq!(evt.order_id, "3");
                assert_eq!(evt.base_asset, "BTC");
                assert_eq!(evt.quote_asset, "USD");
                assert_eq!(evt.fee_asset, "USD");
                assert_eq!(evt.base_asset_amount, dec!(1));
                assert_eq!(evt.quote_asset_amount, dec!(35000));
                // Buy fee: executed base * 0.02
                assert_eq!(evt.fee_amount, dec!(0.02));
                assert_eq!(evt.exchange_order_id, "9848");
            }
            other => panic!("expected BuyOrderCompleted, got {:?}", other),
        }
    }

    #[test]
    fn test_sell_fill_completes_order() {
        let (ledger, mut rx) = ledger();
        track_order(&ledger, OrderSide::Sell, dec!(1));

        ledger.apply_trade_fill("3", 213, dec!(1), dec!(35000));

        assert!(ledger.get("3").is_none());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LifecycleEvent::OrderFilled(_)));
        match &events[1] {
            LifecycleEvent::SellOrderCompleted(evt) => {
                assert_eq!(evt.base_asset_amount, dec!(1));
                assert_eq!(evt.quote_asset_amount, dec!(35000));
                // Sell fee: executed base * executed quote * 0.02
                assert_eq!(evt.fee_amount, dec!(700));
            }
            other => panic!("expected SellOrderCompleted, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_trade_id_is_noop() {
        let (ledger, mut rx) = ledger();
        track_order(&ledger, OrderSide::Buy, dec!(2));

        ledger.apply_trade_fill("3", 213, dec!(1), dec!(35000));
        let first = drain(&mut rx);
        assert_eq!(first.len(), 1);

        let before = ledger.get("3").unwrap();
        ledger.apply_trade_fill("3", 213, dec!(1), dec!(35000));
        let after = ledger.get("3").unwrap();

        assert_eq!(after.executed_amount_base, before.executed_amount_base);
        assert_eq!(after.executed_amount_quote, before.executed_amount_quote);
        assert_eq!(after.fee_paid, before.fee_paid);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_partial_fill_keeps_order_tracked() {
        let (ledger, mut rx) = ledger();
        track_order(&ledger, OrderSide::Buy, dec!(2));

        ledger.apply_trade_fill("3", 213, dec!(1), dec!(35000));

        let order = ledger.get("3").unwrap();
        assert_eq!(order.executed_amount_base, dec!(1));
        assert_eq!(order.executed_amount_quote, dec!(35000));
        assert_eq!(order.remaining_amount(), dec!(1));
        assert_eq!(order.last_state, OrderState::Working);
        assert!(order.trade_ids.contains(&213));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LifecycleEvent::OrderFilled(_)));

        // Second fill completes the order
        ledger.apply_trade_fill("3", 214, dec!(1), dec!(35000));
        assert!(ledger.get("3").is_none());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], LifecycleEvent::BuyOrderCompleted(_)));

        // Fills after completion hit a removed order and are ignored
        ledger.apply_trade_fill("3", 215, dec!(1), dec!(35000));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_fill_for_untracked_order_ignored() {
        let (ledger, mut rx) = ledger();

        ledger.apply_trade_fill("404", 1, dec!(1), dec!(100));

        assert!(ledger.is_empty());
        assert!(drain(&mut rx).is_empty());
    }
}
