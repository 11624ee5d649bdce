use common::NdaxEnvironment;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("No order book exists for '{trading_pair}'")]
    OrderBookNotFound { trading_pair: String },

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Shutdown requested")]
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Trading pairs this connector tracks (e.g. "BTC-USD").
    pub trading_pairs: Vec<String>,
    /// User-stream frame queue capacity.
    pub channel_capacity: usize,
    /// NDAX environment (production or staging).
    pub environment: NdaxEnvironment,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            trading_pairs: vec!["BTC-USD".to_string()],
            channel_capacity: 1024,
            environment: NdaxEnvironment::default(),
        }
    }
}

/// Ordered queue of raw user-stream frames, fed by the websocket session and
/// drained by the dispatcher.
pub type UserStreamSender = mpsc::Sender<String>;
pub type UserStreamReceiver = mpsc::Receiver<String>;

pub fn create_user_stream_channel(capacity: usize) -> (UserStreamSender, UserStreamReceiver) {
    mpsc::channel(capacity)
}
