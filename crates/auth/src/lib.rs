//! Authentication and signing for the NDAX (AlphaPoint) API.
//!
//! This crate provides secure credential management and request signing for
//! both the REST API (header-based authentication) and the websocket user
//! stream (`AuthenticateUser` payload).
//!
//! # Signing scheme
//!
//! NDAX authenticates a request with an HMAC-SHA256 signature over the
//! concatenation `nonce + user_id + api_key`, keyed by the API secret.
//! The same signature scheme is used for REST headers and the websocket
//! authentication payload.
//!
//! # Example
//!
//! ```rust,ignore
//! use auth::{NdaxCredentials, RequestSigner};
//!
//! let credentials = NdaxCredentials::from_env()?;
//! let signer = RequestSigner::new(&credentials);
//!
//! // Headers for an authenticated REST call
//! let headers = signer.auth_headers(nonce);
//!
//! // Payload for the websocket AuthenticateUser request
//! let payload = signer.ws_auth_payload(nonce);
//! ```

mod credentials;
mod error;
mod signer;

pub use credentials::NdaxCredentials;
pub use error::AuthError;
pub use signer::RequestSigner;
