//! NDAX REST API error types.

use auth::AuthError;
use rest_client::RestError;
use thiserror::Error;

/// Errors that can occur when interacting with the NDAX REST API.
#[derive(Debug, Error)]
pub enum NdaxRestError {
    /// REST client error (network, timeout, unexpected payload).
    #[error("REST client error: {0}")]
    Rest(#[from] RestError),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The venue returned no account for the configured user.
    #[error("Unable to resolve account id for the configured user")]
    AccountResolution,
}

impl NdaxRestError {
    /// Check if this error indicates the operation should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rest(rest_err) => rest_err.is_retryable(),
            _ => false,
        }
    }
}
