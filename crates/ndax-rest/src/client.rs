//! NDAX REST API client.

use crate::error::NdaxRestError;
use crate::responses::AccountPositionResponse;
use auth::{NdaxCredentials, RequestSigner};
use common::NdaxEnvironment;
use model::NetworkStatus;
use rest_client::RestClient;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Request timeout for NDAX API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_ACCOUNTS_PATH: &str = "/GetUserAccounts";
const ACCOUNT_POSITIONS_PATH: &str = "/GetAccountPositions";
const PING_PATH: &str = "/Ping";

/// Default OMS id; the venue runs a single order management system.
const OMS_ID: i64 = 1;

/// NDAX REST API client with header-based authentication.
pub struct NdaxRestClient {
    client: RestClient,
    credentials: NdaxCredentials,
    environment: NdaxEnvironment,
}

impl NdaxRestClient {
    /// Create a new NDAX REST client for production.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(credentials: NdaxCredentials) -> Result<Self, NdaxRestError> {
        Self::with_environment(credentials, NdaxEnvironment::Production)
    }

    /// Create a new NDAX REST client for a specific environment.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_environment(
        credentials: NdaxCredentials,
        environment: NdaxEnvironment,
    ) -> Result<Self, NdaxRestError> {
        let client = RestClient::new(environment.rest_base_url(), REQUEST_TIMEOUT)?;

        Ok(Self {
            client,
            credentials,
            environment,
        })
    }

    /// Get the environment this client is connected to.
    pub fn environment(&self) -> NdaxEnvironment {
        self.environment
    }

    /// Resolve the account ids owned by the configured user.
    ///
    /// GET /GetUserAccounts
    ///
    /// The connector uses the first returned id as its trading account.
    pub async fn get_user_accounts(&self) -> Result<Vec<u64>, NdaxRestError> {
        let query = format!(
            "OMSId={}&UserId={}&UserName={}",
            OMS_ID,
            self.credentials.uid(),
            self.credentials.username()
        );

        let headers = self.auth_headers();
        let header_refs: Vec<(&str, &str)> = headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let accounts: Vec<u64> = self
            .client
            .get(USER_ACCOUNTS_PATH, Some(&query), Some(&header_refs))
            .await?;

        tracing::debug!(count = accounts.len(), "User accounts fetched");

        Ok(accounts)
    }

    /// Fetch the balances snapshot for an account.
    ///
    /// GET /GetAccountPositions
    pub async fn get_account_positions(
        &self,
        account_id: u64,
    ) -> Result<Vec<AccountPositionResponse>, NdaxRestError> {
        let query = format!("OMSId={}&AccountId={}", OMS_ID, account_id);

        let headers = self.auth_headers();
        let header_refs: Vec<(&str, &str)> = headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let positions: Vec<AccountPositionResponse> = self
            .client
            .get(ACCOUNT_POSITIONS_PATH, Some(&query), Some(&header_refs))
            .await?;

        tracing::debug!(
            account_id = account_id,
            assets = positions.len(),
            "Account positions fetched"
        );

        Ok(positions)
    }

    /// Issue the venue health check.
    ///
    /// GET /Ping
    ///
    /// Never fails: any transport error, unexpected status code or
    /// unexpected body classifies as `NotConnected`.
    pub async fn check_network(&self) -> NetworkStatus {
        match self.client.get_raw(PING_PATH, None, None).await {
            Ok((status, body)) => classify_ping_response(status, &body),
            Err(e) => {
                tracing::debug!(error = %e, "Ping request failed");
                NetworkStatus::NotConnected
            }
        }
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        let signer = RequestSigner::new(&self.credentials);
        signer.auth_headers(&nonce())
    }
}

/// Classify a /Ping response.
///
/// CONNECTED requires an HTTP 200 and the exact acknowledgement
/// `{"msg": "PONG"}` in the body; anything else is NOT_CONNECTED.
pub fn classify_ping_response(status: u16, body: &serde_json::Value) -> NetworkStatus {
    if status == 200 && body.get("msg").and_then(serde_json::Value::as_str) == Some("PONG") {
        NetworkStatus::Connected
    } else {
        NetworkStatus::NotConnected
    }
}

/// Millisecond wall-clock nonce for request signing.
fn nonce() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string()
}

impl std::fmt::Debug for NdaxRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdaxRestClient")
            .field("environment", &self.environment)
            .field("base_url", &self.environment.rest_base_url())
            .field("uid", &self.credentials.uid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ping_connected_on_200_pong() {
        let status = classify_ping_response(200, &json!({"msg": "PONG"}));
        assert_eq!(status, NetworkStatus::Connected);
    }

    #[test]
    fn test_ping_not_connected_on_wrong_message() {
        let status = classify_ping_response(200, &json!({"msg": "NOT-PONG"}));
        assert_eq!(status, NetworkStatus::NotConnected);
    }

    #[test]
    fn test_ping_not_connected_on_empty_body() {
        let status = classify_ping_response(200, &json!({}));
        assert_eq!(status, NetworkStatus::NotConnected);

        let status = classify_ping_response(200, &serde_json::Value::Null);
        assert_eq!(status, NetworkStatus::NotConnected);
    }

    #[test]
    fn test_ping_not_connected_on_error_status() {
        let status = classify_ping_response(404, &json!({"msg": "PONG"}));
        assert_eq!(status, NetworkStatus::NotConnected);
    }

    #[test]
    fn test_nonce_is_numeric() {
        let n = nonce();
        assert!(!n.is_empty());
        assert!(n.chars().all(|c| c.is_ascii_digit()));
    }
}
