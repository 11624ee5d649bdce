//! Generic REST client infrastructure.
//!
//! This crate provides a thin wrapper around `reqwest` with:
//!
//! - Consistent error handling via `RestError`
//! - JSON response deserialization for typed endpoints
//! - Raw `(status, body)` access for endpoints whose status code is part of
//!   the protocol (e.g. health checks that classify instead of failing)
//! - Header injection for authentication
//! - Rate limit detection
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_client::RestClient;
//!
//! let client = RestClient::with_default_timeout("https://api.ndax.io:8443/AP")?;
//! let accounts: Vec<u64> = client.get("/GetUserAccounts", Some("OMSId=1"), None).await?;
//! ```

mod client;
mod error;

pub use client::RestClient;
pub use error::RestError;
