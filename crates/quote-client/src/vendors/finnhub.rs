//! Finnhub client. Prices only; Finnhub's free tier carries no option chains.

use crate::error::Error;
use crate::http::{Auth, HttpClient, endpoint};
use crate::provider::QuoteProvider;
use crate::types::{OptionChainSnapshot, TokenStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

pub(crate) const DEFAULT_BASE_URL: &str = "https://finnhub.io";

/// Finnhub client; the key travels as the `token` query parameter.
#[derive(Debug, Clone)]
pub struct FinnhubProvider {
    http: HttpClient,
    base_url: String,
    auth: Auth,
}

impl FinnhubProvider {
    /// Creates a client against `base_url`.
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str, token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Auth::Query {
                param: "token",
                value: token,
            },
        }
    }
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    fn name(&self) -> &'static str {
        "finnhub"
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, Error> {
        let url = endpoint(&self.base_url, "/api/v1/quote", &[("symbol", symbol)])?;
        let body: FinnhubQuote = self.http.get_json(url, &self.auth).await?;
        decode_quote(symbol, &body)
    }

    async fn fetch_chain(
        &self,
        _symbol: &str,
        _expiration: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot, Error> {
        Err(Error::Unsupported("finnhub does not serve option chains".to_string()))
    }

    async fn validate_token(&self) -> Result<TokenStatus, Error> {
        let url = endpoint(&self.base_url, "/api/v1/quote", &[("symbol", "AAPL")])?;
        self.http.probe_token(url, &self.auth).await
    }
}

/// `c` is the current price, `pc` the previous close. Unknown symbols come
/// back as all zeros.
#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    c: Option<Decimal>,
    pc: Option<Decimal>,
}

fn decode_quote(symbol: &str, quote: &FinnhubQuote) -> Result<Decimal, Error> {
    [quote.c, quote.pc]
        .into_iter()
        .flatten()
        .find(|p| *p > Decimal::ZERO)
        .ok_or_else(|| Error::NoData(format!("finnhub has no price for {}", symbol)))
}
