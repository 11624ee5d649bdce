use auth::NdaxCredentials;
use connector_core::{create_user_stream_channel, ConnectorConfig};
use connector_ndax::{run_user_stream, NdaxConnector};
use ledger_core::{create_lifecycle_channel, LifecycleEvent};
use metrics::create_metrics;
use model::{Instrument, InstrumentRegistry};
use ndax_rest::NdaxRestClient;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tracing::{error, info};

/// Interval of the heartbeat driving the adaptive poll scheduler.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() {
    common::init_logging();

    let trading_pairs = std::env::args().skip(1).collect::<Vec<_>>();
    let trading_pairs = if trading_pairs.is_empty() {
        vec!["BTC-USD".to_string()]
    } else {
        trading_pairs
    };

    let credentials = match NdaxCredentials::from_env() {
        Ok(credentials) => Arc::new(credentials),
        Err(e) => {
            error!(error = %e, "Missing NDAX credentials");
            return;
        }
    };

    let config = ConnectorConfig {
        trading_pairs,
        channel_capacity: 1024,
        environment: common::NdaxEnvironment::from_env(),
    };

    info!(
        trading_pairs = ?config.trading_pairs,
        environment = %config.environment,
        "Starting NDAX connector"
    );

    let rest = match NdaxRestClient::with_environment((*credentials).clone(), config.environment) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %e, "Failed to build REST client");
            return;
        }
    };

    // Instrument ids are normally loaded from the venue's product registry;
    // assign sequential ids for the pairs given on the command line.
    let instruments = InstrumentRegistry::from_instruments(
        config
            .trading_pairs
            .iter()
            .enumerate()
            .filter_map(|(index, pair)| Instrument::from_trading_pair(index as i64 + 1, pair))
            .collect(),
    );

    let (lifecycle_tx, mut lifecycle_rx) = create_lifecycle_channel();
    let metrics = create_metrics();
    let connector = Arc::new(NdaxConnector::new(
        rest,
        instruments,
        lifecycle_tx,
        metrics.clone(),
    ));

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn websocket session feeding the dispatcher queue
    let (frame_tx, frame_rx) = create_user_stream_channel(config.channel_capacity);
    let stream_handle = tokio::spawn(run_user_stream(
        config.environment,
        credentials.clone(),
        frame_tx,
        connector.stream_activity(),
        shutdown_rx.clone(),
        metrics.clone(),
    ));

    // Spawn dispatcher task
    let dispatcher_handle = {
        let connector = connector.clone();
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move { connector.user_stream_event_listener(frame_rx, shutdown_rx).await })
    };

    // Spawn REST reconciliation loop
    let polling_handle = {
        let connector = connector.clone();
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move { connector.status_polling_loop(shutdown_rx).await })
    };

    // Spawn heartbeat driving the poll scheduler
    {
        let connector = connector.clone();
        let mut shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => connector.tick(unix_now()),
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });
    }

    // Spawn ctrl_c handler
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, initiating shutdown");
            let _ = shutdown_tx_clone.send(true);
        }
    });

    // Report lifecycle events as they arrive
    let mut shutdown_rx_main = shutdown_rx.clone();
    loop {
        tokio::select! {
            event = lifecycle_rx.recv() => {
                match event {
                    Some(event) => log_lifecycle_event(&event),
                    None => break,
                }
            }
            _ = shutdown_rx_main.changed() => {
                if *shutdown_rx_main.borrow() {
                    break;
                }
            }
        }
    }

    info!("Waiting for connector tasks to finish");
    let _ = stream_handle.await;
    let _ = dispatcher_handle.await;
    let _ = polling_handle.await;

    // Print final metrics
    println!("\n{}", metrics.snapshot());

    info!("Shutdown complete");
}

fn log_lifecycle_event(event: &LifecycleEvent) {
    match event {
        LifecycleEvent::OrderFilled(evt) => {
            info!(
                order_id = %evt.order_id,
                trading_pair = %evt.trading_pair,
                price = %evt.price,
                amount = %evt.amount,
                trade_id = %evt.exchange_trade_id,
                "Order filled"
            );
        }
        LifecycleEvent::OrderCancelled(evt) => {
            info!(order_id = %evt.order_id, "Order cancelled");
        }
        LifecycleEvent::MarketOrderFailure(evt) => {
            info!(order_id = %evt.order_id, reason = %evt.reason, "Order failed");
        }
        LifecycleEvent::BuyOrderCompleted(evt) => {
            info!(
                order_id = %evt.order_id,
                base_amount = %evt.base_asset_amount,
                quote_amount = %evt.quote_asset_amount,
                fee = %evt.fee_amount,
                "Buy order completed"
            );
        }
        LifecycleEvent::SellOrderCompleted(evt) => {
            info!(
                order_id = %evt.order_id,
                base_amount = %evt.base_asset_amount,
                quote_amount = %evt.quote_asset_amount,
                fee = %evt.fee_amount,
                "Sell order completed"
            );
        }
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
