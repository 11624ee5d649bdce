//! In-memory order and balance ledgers.
//!
//! This crate holds the connector's single source of truth:
//!
//! - **In-flight orders**: `InFlightOrder`, `InFlightOrderLedger` tracking
//!   every locally-submitted order until it reaches a terminal state
//! - **Balances**: `BalanceLedger` with total/available quantities per asset
//! - **Lifecycle events**: `LifecycleEvent` notifications derived from ledger
//!   transitions (fills, cancellations, failures, completions)
//!
//! # Order Lifecycle
//!
//! 1. The caller submits an order and registers it with `start_tracking`
//! 2. Order state events from the user stream move it through the state
//!    machine (`Working` until a terminal state arrives)
//! 3. Trade events accumulate executed amounts and fees, idempotently per
//!    venue trade id
//! 4. The first terminal transition emits exactly one terminal lifecycle
//!    event and removes the order from the ledger
//!
//! Both ledgers serialize read-modify-write sequences internally, so the
//! user-stream dispatcher and the REST reconciliation loop can share them
//! without additional locking.

mod balances;
mod events;
mod in_flight;
mod order;

pub use balances::{AssetPosition, BalanceEntry, BalanceLedger, LedgerError};
pub use events::{
    create_lifecycle_channel, estimated_fee_percent, LifecycleEvent, LifecycleEventReceiver,
    LifecycleEventSender, MarketOrderFailureEvent, OrderCancelledEvent, OrderCompletedEvent,
    OrderFilledEvent, TradeFee,
};
pub use in_flight::InFlightOrderLedger;
pub use order::{InFlightOrder, OrderSide, OrderState, OrderType};

use uuid::Uuid;

/// Generate a unique client order id with a prefix.
///
/// Format: `{prefix}-{uuid}` where uuid is a v4 UUID in simple format
/// (no hyphens). Unique for the process lifetime and beyond.
pub fn generate_client_order_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().as_simple())
}
