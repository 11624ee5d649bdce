//! User stream wire format.
//!
//! Every frame on the websocket gateway is a message envelope:
//!
//! ```json
//! {"m": 3, "i": 2, "n": "AccountPositionEvent", "o": "{...}"}
//! ```
//!
//! where `m` is the message type (0 request, 1 reply, 3 event), `i` a
//! sequence number, `n` the endpoint name and `o` the JSON-encoded payload
//! string. Payloads are decoded once here into a closed set of typed events;
//! endpoints this connector does not know about surface as
//! [`UserStreamMessage::Unknown`] and must never crash the stream.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const AUTHENTICATE_USER_ENDPOINT_NAME: &str = "AuthenticateUser";
pub const ACCOUNT_POSITION_EVENT_ENDPOINT_NAME: &str = "AccountPositionEvent";
pub const ORDER_STATE_EVENT_ENDPOINT_NAME: &str = "OrderStateEvent";
pub const ORDER_TRADE_EVENT_ENDPOINT_NAME: &str = "OrderTradeEvent";

/// Message type for client-initiated requests.
const REQUEST_MESSAGE_TYPE: i32 = 0;

/// Raw websocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsEnvelope {
    /// Message type.
    #[serde(rename = "m")]
    pub message_type: i32,
    /// Sequence number.
    #[serde(rename = "i")]
    pub sequence: i64,
    /// Endpoint name.
    #[serde(rename = "n")]
    pub endpoint: String,
    /// JSON-encoded payload.
    #[serde(rename = "o")]
    pub payload: String,
}

/// Response payload of an `AuthenticateUser` request.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "Authenticated")]
    pub authenticated: bool,
    #[serde(rename = "SessionToken")]
    pub session_token: Option<String>,
    #[serde(rename = "User")]
    pub user: Option<AuthenticatedUser>,
    #[serde(rename = "errormsg")]
    pub errormsg: Option<String>,
}

/// User details attached to a successful authentication response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedUser {
    #[serde(rename = "UserId")]
    pub user_id: i64,
    #[serde(rename = "AccountId")]
    pub account_id: i64,
    #[serde(rename = "OMSId")]
    pub oms_id: i64,
    #[serde(rename = "UserName", default)]
    pub user_name: String,
}

/// Balance change pushed for one asset of the account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountPositionEvent {
    #[serde(rename = "ProductSymbol")]
    pub product_symbol: String,
    #[serde(rename = "Amount", deserialize_with = "decimal_from_number")]
    pub amount: Decimal,
    #[serde(rename = "Hold", deserialize_with = "decimal_from_number")]
    pub hold: Decimal,
}

/// Order state change pushed for one of the account's orders.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderStateEvent {
    #[serde(rename = "Side")]
    pub side: String,
    #[serde(rename = "OrderId")]
    pub order_id: u64,
    #[serde(rename = "Price", deserialize_with = "decimal_from_number")]
    pub price: Decimal,
    #[serde(rename = "Quantity", deserialize_with = "decimal_from_number")]
    pub quantity: Decimal,
    #[serde(rename = "Instrument")]
    pub instrument: i64,
    #[serde(rename = "OrderType", default)]
    pub order_type: String,
    /// Client order id as assigned at submission; the venue reports it as an
    /// integer.
    #[serde(rename = "ClientOrderId")]
    pub client_order_id: i64,
    #[serde(rename = "OrderState")]
    pub order_state: String,
    #[serde(rename = "OrigQuantity", deserialize_with = "decimal_from_number", default)]
    pub orig_quantity: Decimal,
    #[serde(
        rename = "QuantityExecuted",
        deserialize_with = "decimal_from_number",
        default
    )]
    pub quantity_executed: Decimal,
    #[serde(rename = "ChangeReason", default)]
    pub change_reason: String,
}

/// Trade (fill) pushed for one of the account's orders.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderTradeEvent {
    #[serde(rename = "TradeId")]
    pub trade_id: u64,
    #[serde(rename = "OrderId")]
    pub order_id: u64,
    #[serde(rename = "ClientOrderId")]
    pub client_order_id: i64,
    #[serde(rename = "InstrumentId")]
    pub instrument_id: i64,
    #[serde(rename = "Side")]
    pub side: String,
    #[serde(rename = "Quantity", deserialize_with = "decimal_from_number")]
    pub quantity: Decimal,
    #[serde(rename = "Price", deserialize_with = "decimal_from_number")]
    pub price: Decimal,
    #[serde(rename = "Value", deserialize_with = "decimal_from_number", default)]
    pub value: Decimal,
    #[serde(rename = "TradeTime", default)]
    pub trade_time: i64,
}

/// Decoded user stream message.
#[derive(Debug, Clone)]
pub enum UserStreamMessage {
    /// Reply to the authentication request.
    AuthenticationResponse(AuthResponse),
    /// Account balance change.
    AccountPosition(AccountPositionEvent),
    /// Order state change.
    OrderState(OrderStateEvent),
    /// Order fill.
    OrderTrade(OrderTradeEvent),
    /// Endpoint this connector does not recognize.
    Unknown(WsEnvelope),
}

/// Parse a raw user stream frame into a typed message.
pub fn parse_user_stream_message(text: &str) -> Result<UserStreamMessage, serde_json::Error> {
    let envelope: WsEnvelope = serde_json::from_str(text)?;

    let message = match envelope.endpoint.as_str() {
        AUTHENTICATE_USER_ENDPOINT_NAME => {
            UserStreamMessage::AuthenticationResponse(serde_json::from_str(&envelope.payload)?)
        }
        ACCOUNT_POSITION_EVENT_ENDPOINT_NAME => {
            UserStreamMessage::AccountPosition(serde_json::from_str(&envelope.payload)?)
        }
        ORDER_STATE_EVENT_ENDPOINT_NAME => {
            UserStreamMessage::OrderState(serde_json::from_str(&envelope.payload)?)
        }
        ORDER_TRADE_EVENT_ENDPOINT_NAME => {
            UserStreamMessage::OrderTrade(serde_json::from_str(&envelope.payload)?)
        }
        _ => UserStreamMessage::Unknown(envelope),
    };

    Ok(message)
}

/// Build a client request frame for the given endpoint and payload.
pub fn request_frame(sequence: i64, endpoint: &str, payload: &serde_json::Value) -> String {
    let envelope = WsEnvelope {
        message_type: REQUEST_MESSAGE_TYPE,
        sequence,
        endpoint: endpoint.to_string(),
        payload: payload.to_string(),
    };
    serde_json::to_string(&envelope).expect("envelope serialization cannot fail")
}

/// Deserialize a Decimal from a bare JSON number.
///
/// Quantities arrive as JSON numbers; parsing the number's shortest decimal
/// representation keeps them exact instead of inheriting f64 artifacts.
fn decimal_from_number<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .to_string()
        .parse::<Decimal>()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn envelope(endpoint: &str, payload: serde_json::Value) -> String {
        json!({
            "m": 3,
            "i": 2,
            "n": endpoint,
            "o": payload.to_string(),
        })
        .to_string()
    }

    #[test]
    fn test_parse_authentication_response() {
        let payload = json!({
            "Authenticated": true,
            "SessionToken": "74e7c5b0-26b1-4ca5-b852-79b796b0e599",
            "User": {
                "UserId": 492,
                "UserName": "hbot",
                "Email": "hbot@mailinator.com",
                "EmailVerified": true,
                "AccountId": 528,
                "OMSId": 1,
                "Use2FA": true
            },
            "Locked": false,
            "errormsg": null
        });

        let message = parse_user_stream_message(&envelope("AuthenticateUser", payload)).unwrap();
        match message {
            UserStreamMessage::AuthenticationResponse(resp) => {
                assert!(resp.authenticated);
                let user = resp.user.unwrap();
                assert_eq!(user.user_id, 492);
                assert_eq!(user.account_id, 528);
                assert_eq!(user.oms_id, 1);
                assert_eq!(user.user_name, "hbot");
            }
            other => panic!("expected AuthenticationResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_failed_authentication_response() {
        let payload = json!({
            "Authenticated": false,
            "SessionToken": null,
            "User": null,
            "errormsg": "Invalid signature"
        });

        let message = parse_user_stream_message(&envelope("AuthenticateUser", payload)).unwrap();
        match message {
            UserStreamMessage::AuthenticationResponse(resp) => {
                assert!(!resp.authenticated);
                assert_eq!(resp.errormsg.as_deref(), Some("Invalid signature"));
            }
            other => panic!("expected AuthenticationResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_account_position_event() {
        let payload = json!({
            "OMSId": 1,
            "AccountId": 5,
            "ProductSymbol": "BTC",
            "ProductId": 1,
            "Amount": 10499.1,
            "Hold": 2.1,
            "PendingDeposits": 10,
            "PendingWithdraws": 20,
            "TotalDayDeposits": 30,
            "TotalDayWithdraws": 40
        });

        let message =
            parse_user_stream_message(&envelope("AccountPositionEvent", payload)).unwrap();
        match message {
            UserStreamMessage::AccountPosition(evt) => {
                assert_eq!(evt.product_symbol, "BTC");
                assert_eq!(evt.amount, dec!(10499.1));
                assert_eq!(evt.hold, dec!(2.1));
            }
            other => panic!("expected AccountPosition, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_order_state_event() {
        let payload = json!({
            "Side": "Sell",
            "OrderId": 9849,
            "Price": 35000,
            "Quantity": 1,
            "Instrument": 1,
            "Account": 4,
            "OrderType": "Limit",
            "ClientOrderId": 3,
            "OrderState": "Canceled",
            "ReceiveTime": 0,
            "OrigQuantity": 1,
            "QuantityExecuted": 0,
            "AvgPrice": 0,
            "ChangeReason": "NewInputAccepted"
        });

        let message = parse_user_stream_message(&envelope("OrderStateEvent", payload)).unwrap();
        match message {
            UserStreamMessage::OrderState(evt) => {
                assert_eq!(evt.side, "Sell");
                assert_eq!(evt.order_id, 9849);
                assert_eq!(evt.client_order_id, 3);
                assert_eq!(evt.order_state, "Canceled");
                assert_eq!(evt.change_reason, "NewInputAccepted");
                assert_eq!(evt.price, dec!(35000));
                assert_eq!(evt.orig_quantity, dec!(1));
            }
            other => panic!("expected OrderState, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_order_trade_event() {
        let payload = json!({
            "OMSId": 1,
            "TradeId": 213,
            "OrderId": 9848,
            "AccountId": 4,
            "ClientOrderId": 3,
            "InstrumentId": 1,
            "Side": "Buy",
            "Quantity": 1,
            "Price": 35000,
            "Value": 35000,
            "TradeTime": 635978008210426109i64,
            "ContraAcctId": 3,
            "OrderTradeRevision": 1,
            "Direction": "NoChange"
        });

        let message = parse_user_stream_message(&envelope("OrderTradeEvent", payload)).unwrap();
        match message {
            UserStreamMessage::OrderTrade(evt) => {
                assert_eq!(evt.trade_id, 213);
                assert_eq!(evt.order_id, 9848);
                assert_eq!(evt.client_order_id, 3);
                assert_eq!(evt.quantity, dec!(1));
                assert_eq!(evt.price, dec!(35000));
                assert_eq!(evt.value, dec!(35000));
            }
            other => panic!("expected OrderTrade, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_endpoint() {
        let message = parse_user_stream_message(&envelope("UnknownEndpoint", json!({}))).unwrap();
        match message {
            UserStreamMessage::Unknown(env) => {
                assert_eq!(env.endpoint, "UnknownEndpoint");
                assert_eq!(env.message_type, 3);
            }
            other => panic!("expected Unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid_json_is_error() {
        assert!(parse_user_stream_message("not json").is_err());
        // Valid envelope, broken payload for a known endpoint
        let raw = json!({"m": 3, "i": 2, "n": "OrderTradeEvent", "o": "{"}).to_string();
        assert!(parse_user_stream_message(&raw).is_err());
    }

    #[test]
    fn test_request_frame_roundtrip() {
        let frame = request_frame(2, AUTHENTICATE_USER_ENDPOINT_NAME, &json!({"APIKey": "k"}));

        let envelope: WsEnvelope = serde_json::from_str(&frame).unwrap();
        assert_eq!(envelope.message_type, 0);
        assert_eq!(envelope.sequence, 2);
        assert_eq!(envelope.endpoint, "AuthenticateUser");

        let payload: serde_json::Value = serde_json::from_str(&envelope.payload).unwrap();
        assert_eq!(payload["APIKey"], "k");
    }
}
