//! NDAX API response types.

use rust_decimal::Decimal;
use serde::Deserialize;

/// One entry of a GET /GetAccountPositions response.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountPositionResponse {
    /// Asset symbol (e.g. "BTC").
    #[serde(rename = "ProductSymbol")]
    pub product_symbol: String,
    /// Total balance including holds.
    #[serde(rename = "Amount", deserialize_with = "decimal_from_number")]
    pub amount: Decimal,
    /// Amount reserved against open orders.
    #[serde(rename = "Hold", deserialize_with = "decimal_from_number")]
    pub hold: Decimal,
}

/// Deserialize a Decimal from a bare JSON number.
///
/// The venue encodes quantities as JSON numbers, not strings. Going through
/// the number's shortest decimal representation avoids the binary-float
/// artifacts of converting the raw f64 directly.
pub(crate) fn decimal_from_number<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .to_string()
        .parse::<Decimal>()
        .map_err(serde::de::Error::custom)
}
