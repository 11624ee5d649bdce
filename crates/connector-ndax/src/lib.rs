//! NDAX exchange connector.
//!
//! Keeps a local view of orders, balances and fills synchronized with the
//! venue through two complementary channels:
//!
//! - a continuous authenticated websocket **user stream** delivering
//!   low-latency account-position, order-state and trade events
//! - a periodic **REST reconciliation** poll whose cadence adapts to stream
//!   health (see [`PollScheduler`])
//!
//! Both paths converge on the ledgers owned by [`NdaxConnector`], the single
//! source of truth queried by the strategy/supervisor layer.

mod exchange;
mod messages;
mod scheduler;
mod user_stream;

pub use exchange::NdaxConnector;
pub use messages::{
    parse_user_stream_message, request_frame, AccountPositionEvent, AuthResponse,
    AuthenticatedUser, OrderStateEvent, OrderTradeEvent, UserStreamMessage, WsEnvelope,
    ACCOUNT_POSITION_EVENT_ENDPOINT_NAME, AUTHENTICATE_USER_ENDPOINT_NAME,
    ORDER_STATE_EVENT_ENDPOINT_NAME, ORDER_TRADE_EVENT_ENDPOINT_NAME,
};
pub use scheduler::{
    PollScheduler, StreamActivity, LONG_POLL_INTERVAL, SHORT_POLL_INTERVAL,
    USER_STREAM_SILENCE_THRESHOLD,
};
pub use user_stream::run_user_stream;
