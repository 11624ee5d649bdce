//! The NDAX connector aggregate.
//!
//! Owns the order and balance ledgers and funnels every mutation through
//! them: the user-stream dispatcher and the REST reconciliation loop both
//! run against this type and never share any other mutable state.

use crate::messages::{parse_user_stream_message, UserStreamMessage};
use crate::scheduler::{PollScheduler, StreamActivity};
use connector_core::{ConnectorError, UserStreamReceiver};
use dashmap::DashMap;
use ledger_core::{
    AssetPosition, BalanceLedger, InFlightOrder, InFlightOrderLedger, LedgerError,
    LifecycleEventSender, OrderSide, OrderState, OrderType,
};
use metrics::SharedMetrics;
use model::{InstrumentRegistry, NetworkStatus};
use ndax_rest::{NdaxRestClient, NdaxRestError};
use orderbook::OrderBook;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Delay before the dispatcher resumes after an unexpected error.
const DISPATCH_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Exchange connector keeping local order/balance state synchronized with
/// NDAX through the user stream and periodic REST reconciliation.
pub struct NdaxConnector {
    rest: Arc<NdaxRestClient>,
    instruments: InstrumentRegistry,
    in_flight: InFlightOrderLedger,
    balances: BalanceLedger,
    order_books: DashMap<String, Arc<RwLock<OrderBook>>>,
    scheduler: PollScheduler,
    activity: Arc<StreamActivity>,
    account_id: RwLock<Option<u64>>,
    metrics: SharedMetrics,
}

impl NdaxConnector {
    /// Create a connector.
    ///
    /// Lifecycle events derived from ledger transitions are emitted on
    /// `events`.
    pub fn new(
        rest: Arc<NdaxRestClient>,
        instruments: InstrumentRegistry,
        events: LifecycleEventSender,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            rest,
            instruments,
            in_flight: InFlightOrderLedger::new(events),
            balances: BalanceLedger::new(),
            order_books: DashMap::new(),
            scheduler: PollScheduler::new(),
            activity: Arc::new(StreamActivity::new()),
            account_id: RwLock::new(None),
            metrics,
        }
    }

    /// Stream-activity tracker shared with the websocket session task.
    pub fn stream_activity(&self) -> Arc<StreamActivity> {
        self.activity.clone()
    }

    /// Registered instruments.
    pub fn instruments(&self) -> &InstrumentRegistry {
        &self.instruments
    }

    // ========================================================================
    // Order tracking
    // ========================================================================

    /// Begin tracking a locally-submitted order.
    #[allow(clippy::too_many_arguments)]
    pub fn start_tracking_order(
        &self,
        client_order_id: &str,
        exchange_order_id: &str,
        trading_pair: &str,
        side: OrderSide,
        price: Decimal,
        amount: Decimal,
        order_type: OrderType,
    ) {
        if self.instruments.get_by_pair(trading_pair).is_none() {
            warn!(
                trading_pair = %trading_pair,
                "Tracking order for a trading pair missing from the instrument registry"
            );
        }
        self.in_flight.start_tracking(
            client_order_id,
            exchange_order_id,
            trading_pair,
            side,
            price,
            amount,
            order_type,
        );
    }

    /// Stop tracking an order without emitting events.
    pub fn stop_tracking_order(&self, client_order_id: &str) -> Option<InFlightOrder> {
        self.in_flight.stop_tracking(client_order_id)
    }

    /// Snapshot of a tracked order.
    pub fn in_flight_order(&self, client_order_id: &str) -> Option<InFlightOrder> {
        self.in_flight.get(client_order_id)
    }

    /// Client order ids of all tracked orders.
    pub fn in_flight_order_ids(&self) -> Vec<String> {
        self.in_flight.client_order_ids()
    }

    // ========================================================================
    // Balances
    // ========================================================================

    /// Total balance for an asset.
    pub fn get_balance(&self, asset: &str) -> Result<Decimal, LedgerError> {
        self.balances.get_balance(asset)
    }

    /// Available balance for an asset.
    pub fn get_available_balance(&self, asset: &str) -> Result<Decimal, LedgerError> {
        self.balances.get_available_balance(asset)
    }

    // ========================================================================
    // Order books
    // ========================================================================

    /// Register an order book for a trading pair, returning its handle.
    ///
    /// The depth data source keeps the book updated through the returned
    /// handle; an existing book for the pair is reused.
    pub fn register_order_book(&self, trading_pair: &str) -> Arc<RwLock<OrderBook>> {
        self.order_books
            .entry(trading_pair.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(OrderBook::new(trading_pair))))
            .clone()
    }

    /// Shared read handle to the order book for a trading pair.
    pub fn get_order_book(
        &self,
        trading_pair: &str,
    ) -> Result<Arc<RwLock<OrderBook>>, ConnectorError> {
        self.order_books
            .get(trading_pair)
            .map(|book| book.clone())
            .ok_or_else(|| ConnectorError::OrderBookNotFound {
                trading_pair: trading_pair.to_string(),
            })
    }

    // ========================================================================
    // Poll scheduling
    // ========================================================================

    /// Advance the adaptive poll scheduler (external heartbeat).
    pub fn tick(&self, timestamp: f64) {
        self.scheduler.tick(timestamp, &self.activity);
    }

    /// Whether a REST refresh is currently marked due.
    pub fn is_poll_due(&self) -> bool {
        self.scheduler.is_poll_due()
    }

    /// Clear the refresh-due flag.
    pub fn reset_poll_notifier(&self) {
        self.scheduler.reset_poll();
    }

    // ========================================================================
    // REST reconciliation
    // ========================================================================

    /// Resolve (and cache) the trading account id for the configured user.
    pub async fn account_id(&self) -> Result<u64, NdaxRestError> {
        if let Some(account_id) = *self.account_id.read() {
            return Ok(account_id);
        }

        let accounts = self.rest.get_user_accounts().await?;
        let account_id = accounts
            .first()
            .copied()
            .ok_or(NdaxRestError::AccountResolution)?;

        info!(account_id = account_id, "Resolved trading account");
        *self.account_id.write() = Some(account_id);
        Ok(account_id)
    }

    /// Fetch the balances snapshot and merge it into the balance ledger.
    pub async fn update_balances(&self) -> Result<(), NdaxRestError> {
        let account_id = self.account_id().await?;
        let positions = self.rest.get_account_positions(account_id).await?;

        let snapshot: Vec<AssetPosition> = positions
            .into_iter()
            .map(|position| AssetPosition {
                asset: position.product_symbol,
                total: position.amount,
                hold: position.hold,
            })
            .collect();

        self.balances.reconcile_from_snapshot(&snapshot);
        Ok(())
    }

    /// Venue connectivity check; classifies instead of failing.
    pub async fn check_network(&self) -> NetworkStatus {
        self.rest.check_network().await
    }

    /// Run REST reconciliation whenever the scheduler marks a refresh due.
    ///
    /// Failures are logged and the loop continues; only shutdown ends it.
    pub async fn status_polling_loop(&self, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown requested, exiting status polling loop");
                        return;
                    }
                }

                _ = self.scheduler.poll_requested() => {
                    self.scheduler.reset_poll();

                    if let Err(e) = self.update_balances().await {
                        warn!(error = %e, "Failed to refresh account balances");
                    }
                    self.metrics.inc_rest_polls();
                }
            }
        }
    }

    // ========================================================================
    // User stream dispatch
    // ========================================================================

    /// Drain the ordered user-stream frame queue and route each event into
    /// the ledgers.
    ///
    /// Errors raised while handling a single frame are contained here: the
    /// loop logs, pauses briefly and keeps reading. Only queue closure and
    /// the shutdown signal end the loop.
    pub async fn user_stream_event_listener(
        &self,
        mut queue: UserStreamReceiver,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), ConnectorError> {
        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown requested, exiting user stream listener");
                        return Ok(());
                    }
                }

                frame = queue.recv() => {
                    let Some(raw) = frame else {
                        info!("User stream queue closed, exiting listener");
                        return Err(ConnectorError::ChannelClosed);
                    };

                    if let Err(e) = self.process_user_stream_event(&raw) {
                        self.metrics.inc_parse_errors();
                        debug!(error = %e, frame = %raw, "Failed to process user stream event");
                        error!("Unknown error. Retrying after 1 seconds.");
                        tokio::time::sleep(DISPATCH_RETRY_DELAY).await;
                    }
                }
            }
        }
    }

    /// Decode one raw frame and route it to the right ledger operation.
    fn process_user_stream_event(&self, raw: &str) -> Result<(), ConnectorError> {
        let message =
            parse_user_stream_message(raw).map_err(|e| ConnectorError::Parse(e.to_string()))?;

        match message {
            UserStreamMessage::AccountPosition(evt) => {
                self.balances
                    .apply_account_position(&evt.product_symbol, evt.amount, evt.hold);
                self.metrics.inc_events_dispatched();
            }
            UserStreamMessage::OrderState(evt) => {
                let state = OrderState::from_venue_str(&evt.order_state);
                self.in_flight.apply_order_state(
                    &evt.client_order_id.to_string(),
                    state,
                    &evt.change_reason,
                );
                self.metrics.inc_events_dispatched();
            }
            UserStreamMessage::OrderTrade(evt) => {
                self.in_flight.apply_trade_fill(
                    &evt.client_order_id.to_string(),
                    evt.trade_id,
                    evt.quantity,
                    evt.price,
                );
                self.metrics.inc_events_dispatched();
            }
            UserStreamMessage::AuthenticationResponse(resp) => {
                debug!(
                    authenticated = resp.authenticated,
                    "Authentication response on user stream"
                );
            }
            UserStreamMessage::Unknown(_) => {
                debug!("Unknown event received from the connector ({})", raw);
            }
        }

        Ok(())
    }
}
