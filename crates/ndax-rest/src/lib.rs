//! NDAX (AlphaPoint) REST API client.
//!
//! Covers the calls the connector core needs for reconciliation:
//!
//! - `GetUserAccounts` - resolve the account id for the configured user
//! - `GetAccountPositions` - balances snapshot per asset
//! - `Ping` - network health check, classified rather than failing

mod client;
mod error;
mod responses;

pub use client::{classify_ping_response, NdaxRestClient};
pub use error::NdaxRestError;
pub use responses::AccountPositionResponse;
