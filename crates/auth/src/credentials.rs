//! Secure API credential management.
//!
//! Uses the `secrecy` crate to prevent accidental logging of secret keys
//! and ensures memory is zeroed on drop.

use crate::error::AuthError;
use secrecy::{ExposeSecret, SecretString};

/// NDAX API credentials for authenticated requests.
///
/// The secret key is wrapped in `SecretString` which:
/// - Prevents accidental Debug/Display printing
/// - Zeros memory on drop via zeroize
#[derive(Clone)]
pub struct NdaxCredentials {
    uid: String,
    api_key: String,
    secret_key: SecretString,
    username: String,
}

impl NdaxCredentials {
    /// Load credentials from environment variables.
    ///
    /// Looks for:
    /// - `NDAX_UID` - The numeric user id assigned by the venue
    /// - `NDAX_API_KEY` - The API key (public)
    /// - `NDAX_SECRET_KEY` - The secret key (private)
    /// - `NDAX_USERNAME` - The account username
    ///
    /// # Errors
    /// Returns `AuthError::MissingEnvVar` if any variable is not set.
    pub fn from_env() -> Result<Self, AuthError> {
        // Load .env file if present (ignores errors if file doesn't exist)
        dotenvy::dotenv().ok();

        let uid =
            std::env::var("NDAX_UID").map_err(|_| AuthError::MissingEnvVar("NDAX_UID".into()))?;

        let api_key = std::env::var("NDAX_API_KEY")
            .map_err(|_| AuthError::MissingEnvVar("NDAX_API_KEY".into()))?;

        let secret_key = std::env::var("NDAX_SECRET_KEY")
            .map_err(|_| AuthError::MissingEnvVar("NDAX_SECRET_KEY".into()))?;

        let username = std::env::var("NDAX_USERNAME")
            .map_err(|_| AuthError::MissingEnvVar("NDAX_USERNAME".into()))?;

        Ok(Self::new(uid, api_key, secret_key, username))
    }

    /// Create credentials from explicit values.
    ///
    /// Useful for testing or when credentials come from other sources.
    pub fn new(uid: String, api_key: String, secret_key: String, username: String) -> Self {
        Self {
            uid,
            api_key,
            secret_key: SecretString::from(secret_key),
            username,
        }
    }

    /// Get the venue-assigned user id (public, safe to log).
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Get the API key (public, safe to log).
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the account username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Expose the secret key for signing.
    ///
    /// **WARNING**: Only use this for cryptographic operations.
    /// Never log or display the return value.
    pub fn expose_secret(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

impl std::fmt::Debug for NdaxCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdaxCredentials")
            .field("uid", &self.uid)
            .field("api_key", &self.api_key)
            .field("secret_key", &"[REDACTED]")
            .field("username", &self.username)
            .finish()
    }
}
