//! Alpha Vantage client.
//!
//! Alpha Vantage answers 200 for almost everything; bad keys and throttling
//! arrive as `Information` / `Note` / `Error Message` fields in the body.

use crate::error::Error;
use crate::http::{Auth, HttpClient, endpoint};
use crate::provider::QuoteProvider;
use crate::types::{OptionChainSnapshot, TokenStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

pub(crate) const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Alpha Vantage client; the key travels as the `apikey` query parameter.
#[derive(Debug, Clone)]
pub struct AlphaVantageProvider {
    http: HttpClient,
    base_url: String,
    auth: Auth,
}

impl AlphaVantageProvider {
    /// Creates a client against `base_url`.
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str, token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Auth::Query {
                param: "apikey",
                value: token,
            },
        }
    }

    async fn global_quote(&self, symbol: &str) -> Result<GlobalQuoteEnvelope, Error> {
        let url = endpoint(
            &self.base_url,
            "/query",
            &[("function", "GLOBAL_QUOTE"), ("symbol", symbol)],
        )?;
        self.http.get_json(url, &self.auth).await
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, Error> {
        let body = self.global_quote(symbol).await?;
        decode_global_quote(symbol, body)
    }

    async fn fetch_chain(
        &self,
        _symbol: &str,
        _expiration: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot, Error> {
        Err(Error::Unsupported(
            "alpha vantage does not serve option chains".to_string(),
        ))
    }

    async fn validate_token(&self) -> Result<TokenStatus, Error> {
        match self.global_quote("IBM").await {
            Ok(body) => match body.rejection() {
                Some(Error::Unauthorized(reason)) => Ok(TokenStatus::Invalid { reason }),
                Some(other) => Err(other),
                None => Ok(TokenStatus::Valid),
            },
            Err(Error::Unauthorized(reason)) => Ok(TokenStatus::Invalid { reason }),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteEnvelope {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<Decimal>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<Decimal>,
}

impl GlobalQuoteEnvelope {
    /// Error carried in a 200 body, if any.
    fn rejection(&self) -> Option<Error> {
        let message = self.information.as_ref().or(self.note.as_ref())?;
        if message.to_ascii_lowercase().contains("api key") || message.contains("apikey") {
            Some(Error::Unauthorized(message.clone()))
        } else {
            Some(Error::Network(message.clone()))
        }
    }
}

fn decode_global_quote(symbol: &str, body: GlobalQuoteEnvelope) -> Result<Decimal, Error> {
    if let Some(err) = body.rejection() {
        return Err(err);
    }
    if let Some(message) = body.error_message {
        return Err(Error::NoData(message));
    }
    body.global_quote
        .and_then(|q| {
            [q.price, q.previous_close]
                .into_iter()
                .flatten()
                .find(|p| *p > Decimal::ZERO)
        })
        .ok_or_else(|| Error::NoData(format!("alpha vantage has no quote for {}", symbol)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_price_from_string_fields() {
        let body: GlobalQuoteEnvelope = serde_json::from_str(
            r#"{"Global Quote":{"01. symbol":"IBM","05. price":"189.8400","08. previous close":"188.0000"}}"#,
        )
        .unwrap();
        assert_eq!(decode_global_quote("IBM", body).unwrap(), dec!(189.84));
    }

    #[test]
    fn test_empty_global_quote_is_no_data() {
        let body: GlobalQuoteEnvelope = serde_json::from_str(r#"{"Global Quote":{}}"#).unwrap();
        assert!(matches!(decode_global_quote("ZZZZ", body), Err(Error::NoData(_))));
    }

    #[test]
    fn test_bad_key_is_unauthorized() {
        let body: GlobalQuoteEnvelope = serde_json::from_str(
            r#"{"Information":"The demo API key is for demo purposes only. Please claim your free API key."}"#,
        )
        .unwrap();
        assert!(matches!(
            decode_global_quote("IBM", body),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn test_rate_limit_note_is_network() {
        let body: GlobalQuoteEnvelope = serde_json::from_str(
            r#"{"Note":"Thank you for using Alpha Vantage! Our standard call frequency is 5 calls per minute."}"#,
        )
        .unwrap();
        assert!(matches!(decode_global_quote("IBM", body), Err(Error::Network(_))));
    }
}
