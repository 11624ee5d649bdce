//! NDAX environment configuration.
//!
//! Supports the production venue and the AlphaPoint staging venue with
//! appropriate base URLs.

use std::fmt;
use std::str::FromStr;

/// NDAX environment (production or staging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NdaxEnvironment {
    /// Production environment (real money).
    #[default]
    Production,
    /// Staging environment (paper accounts for testing).
    Staging,
}

impl NdaxEnvironment {
    /// REST API base URL.
    pub fn rest_base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://api.ndax.io:8443/AP",
            Self::Staging => "https://ndaxmarginstaging.cdnhop.net:8443/AP",
        }
    }

    /// WebSocket gateway URL for the authenticated user stream.
    pub fn ws_url(&self) -> &'static str {
        match self {
            Self::Production => "wss://api.ndax.io/WSGateway",
            Self::Staging => "wss://ndaxmarginstaging.cdnhop.net/WSGateway",
        }
    }

    /// Returns true if this is the production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Load environment from the `NDAX_ENVIRONMENT` env var.
    ///
    /// Returns `Production` if not set or invalid.
    pub fn from_env() -> Self {
        std::env::var("NDAX_ENVIRONMENT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for NdaxEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Staging => write!(f, "staging"),
        }
    }
}

impl FromStr for NdaxEnvironment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" | "mainnet" | "main" => Ok(Self::Production),
            "staging" | "stage" | "test" | "sandbox" => Ok(Self::Staging),
            _ => Err(ParseEnvironmentError(s.to_string())),
        }
    }
}

/// Error parsing environment string.
#[derive(Debug, Clone)]
pub struct ParseEnvironmentError(String);

impl fmt::Display for ParseEnvironmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid environment '{}', expected 'production' or 'staging'",
            self.0
        )
    }
}

impl std::error::Error for ParseEnvironmentError {}
