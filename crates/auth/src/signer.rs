//! HMAC-SHA256 request signing for the NDAX API.

use crate::credentials::NdaxCredentials;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Request signer for authenticated NDAX API calls.
pub struct RequestSigner<'a> {
    credentials: &'a NdaxCredentials,
}

impl<'a> RequestSigner<'a> {
    /// Create a new request signer with the given credentials.
    pub fn new(credentials: &'a NdaxCredentials) -> Self {
        Self { credentials }
    }

    /// Sign a message and return the hex-encoded signature.
    ///
    /// This computes HMAC-SHA256 of the message using the secret key
    /// and returns the result as a lowercase hex string.
    pub fn sign(&self, message: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.credentials.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");

        mac.update(message.as_bytes());
        let result = mac.finalize();
        hex::encode(result.into_bytes())
    }

    /// Sign a nonce using the venue's concatenation rule.
    ///
    /// The signed message is `nonce + user_id + api_key`, which is what the
    /// venue expects for both REST headers and the websocket handshake.
    pub fn sign_nonce(&self, nonce: &str) -> String {
        let message = format!(
            "{}{}{}",
            nonce,
            self.credentials.uid(),
            self.credentials.api_key()
        );
        self.sign(&message)
    }

    /// Build the authentication headers for a REST request.
    ///
    /// Produces the `Nonce`, `APIKey`, `Signature` and `UserId` headers.
    pub fn auth_headers(&self, nonce: &str) -> Vec<(String, String)> {
        vec![
            ("Nonce".to_string(), nonce.to_string()),
            ("APIKey".to_string(), self.credentials.api_key().to_string()),
            ("Signature".to_string(), self.sign_nonce(nonce)),
            ("UserId".to_string(), self.credentials.uid().to_string()),
        ]
    }

    /// Build the payload for the websocket `AuthenticateUser` request.
    pub fn ws_auth_payload(&self, nonce: &str) -> serde_json::Value {
        json!({
            "APIKey": self.credentials.api_key(),
            "Signature": self.sign_nonce(nonce),
            "UserId": self.credentials.uid(),
            "Nonce": nonce,
        })
    }
}
