//! Authenticated user stream WebSocket session.
//!
//! Connects to the venue's websocket gateway, performs the
//! `AuthenticateUser` handshake and forwards every subsequent frame into the
//! dispatcher queue. Handles reconnection with exponential backoff; a
//! rejected authentication is retried on a fixed one-second delay.

use crate::messages::{
    parse_user_stream_message, request_frame, UserStreamMessage, AUTHENTICATE_USER_ENDPOINT_NAME,
};
use crate::scheduler::StreamActivity;
use auth::{NdaxCredentials, RequestSigner};
use common::{ExponentialBackoff, NdaxEnvironment};
use connector_core::{ConnectorError, UserStreamSender};
use futures_util::{SinkExt, StreamExt};
use metrics::SharedMetrics;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Timeout for WebSocket connection attempts.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed delay before retrying after a rejected authentication.
const AUTH_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Result of a user stream session.
enum SessionResult {
    /// Shutdown was requested
    Shutdown,
    /// The venue rejected the authentication request
    AuthFailed(String),
    /// Connection or queue error occurred
    Error(ConnectorError),
}

/// Run the user stream with authentication and automatic reconnection.
///
/// Every received text frame stamps `activity` with the wall-clock receipt
/// time and is forwarded into `sender` for the dispatcher. Returns when the
/// shutdown signal fires or when the dispatcher queue is dropped.
pub async fn run_user_stream(
    environment: NdaxEnvironment,
    credentials: Arc<NdaxCredentials>,
    sender: UserStreamSender,
    activity: Arc<StreamActivity>,
    mut shutdown_rx: watch::Receiver<bool>,
    metrics: SharedMetrics,
) -> Result<(), ConnectorError> {
    let url = environment.ws_url();
    let mut backoff = ExponentialBackoff::default();
    let mut sequence: i64 = 0;

    loop {
        if *shutdown_rx.borrow() {
            info!("Shutdown requested, exiting user stream");
            return Ok(());
        }

        match run_session(
            url,
            &credentials,
            &sender,
            &activity,
            &mut shutdown_rx,
            &metrics,
            &mut sequence,
        )
        .await
        {
            SessionResult::Shutdown => {
                info!("User stream shutdown complete");
                return Ok(());
            }
            SessionResult::AuthFailed(reason) => {
                metrics.inc_auth_failures();
                error!(reason = %reason, "User stream authentication failed, retrying in 1 second");

                tokio::select! {
                    _ = tokio::time::sleep(AUTH_RETRY_DELAY) => {}
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            return Ok(());
                        }
                    }
                }
            }
            SessionResult::Error(ConnectorError::ChannelClosed) => {
                info!("Dispatcher queue closed, exiting user stream");
                return Err(ConnectorError::ChannelClosed);
            }
            SessionResult::Error(e) => {
                metrics.inc_reconnect_attempts();

                let delay = backoff.next_delay();
                warn!(
                    error = %e,
                    attempt = backoff.attempt(),
                    delay_secs = delay.as_secs_f64(),
                    "User stream disconnected, reconnecting"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

/// Run a single authenticated session.
async fn run_session(
    url: &str,
    credentials: &NdaxCredentials,
    sender: &UserStreamSender,
    activity: &StreamActivity,
    shutdown_rx: &mut watch::Receiver<bool>,
    metrics: &SharedMetrics,
    sequence: &mut i64,
) -> SessionResult {
    info!(url = %url, "Connecting to user stream");

    let ws_stream = match tokio::time::timeout(CONNECTION_TIMEOUT, connect_async(url)).await {
        Ok(Ok((stream, _))) => stream,
        Ok(Err(e)) => {
            metrics.inc_websocket_errors();
            return SessionResult::Error(ConnectorError::WebSocket(e.to_string()));
        }
        Err(_) => {
            metrics.inc_websocket_errors();
            return SessionResult::Error(ConnectorError::WebSocket("connection timeout".into()));
        }
    };

    let (mut write, mut read) = ws_stream.split();

    // AlphaPoint request sequence numbers are even
    *sequence += 2;
    let signer = RequestSigner::new(credentials);
    let payload = signer.ws_auth_payload(&nonce());
    let frame = request_frame(*sequence, AUTHENTICATE_USER_ENDPOINT_NAME, &payload);

    if let Err(e) = write.send(Message::Text(frame)).await {
        metrics.inc_websocket_errors();
        return SessionResult::Error(ConnectorError::WebSocket(e.to_string()));
    }

    let mut authenticated = false;

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("Shutdown signal received, closing user stream");
                    let _ = write.close().await;
                    return SessionResult::Shutdown;
                }
            }

            msg_opt = read.next() => {
                match msg_opt {
                    Some(Ok(Message::Text(text))) => {
                        activity.record(unix_now());
                        metrics.inc_messages_received();

                        if !authenticated {
                            match parse_user_stream_message(&text) {
                                Ok(UserStreamMessage::AuthenticationResponse(resp)) => {
                                    if resp.authenticated {
                                        info!("User stream authenticated");
                                        authenticated = true;
                                    } else {
                                        let reason = resp
                                            .errormsg
                                            .unwrap_or_else(|| "authentication rejected".to_string());
                                        return SessionResult::AuthFailed(reason);
                                    }
                                }
                                Ok(_) => {
                                    debug!("Frame received before authentication reply, ignoring");
                                }
                                Err(e) => {
                                    metrics.inc_parse_errors();
                                    return SessionResult::AuthFailed(format!(
                                        "undecodable authentication reply: {}",
                                        e
                                    ));
                                }
                            }
                            continue;
                        }

                        if sender.send(text).await.is_err() {
                            return SessionResult::Error(ConnectorError::ChannelClosed);
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        debug!("Received Ping, sending Pong");
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            warn!(error = %e, "Failed to send Pong");
                            metrics.inc_websocket_errors();
                            return SessionResult::Error(ConnectorError::WebSocket(e.to_string()));
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("User stream closed by server");
                        return SessionResult::Error(ConnectorError::ConnectionClosed);
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "User stream error");
                        metrics.inc_websocket_errors();
                        return SessionResult::Error(ConnectorError::WebSocket(e.to_string()));
                    }
                    None => {
                        info!("User stream ended");
                        return SessionResult::Error(ConnectorError::ConnectionClosed);
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Millisecond wall-clock nonce for the authentication handshake.
fn nonce() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string()
}

/// Current unix time in seconds.
fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
