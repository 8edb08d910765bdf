//! Tradier market data client.

use super::OneOrMany;
use crate::error::Error;
use crate::http::{Auth, HttpClient, endpoint};
use crate::provider::QuoteProvider;
use crate::types::{OptionChainSnapshot, OptionContract, OptionKind, TokenStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.tradier.com";

/// Tradier client authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct TradierProvider {
    http: HttpClient,
    base_url: String,
    auth: Auth,
}

impl TradierProvider {
    /// Creates a client against `base_url`.
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str, token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Auth::Bearer(token),
        }
    }

    async fn fetch_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, Error> {
        let url = endpoint(
            &self.base_url,
            "/v1/markets/options/expirations",
            &[("symbol", symbol)],
        )?;
        let body: ExpirationsEnvelope = self.http.get_json(url, &self.auth).await?;
        Ok(decode_expirations(body))
    }
}

#[async_trait]
impl QuoteProvider for TradierProvider {
    fn name(&self) -> &'static str {
        "tradier"
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, Error> {
        let url = endpoint(&self.base_url, "/v1/markets/quotes", &[("symbols", symbol)])?;
        let body: QuotesEnvelope = self.http.get_json(url, &self.auth).await?;
        decode_price(symbol, body)
    }

    async fn fetch_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot, Error> {
        let expirations = self.fetch_expirations(symbol).await?;
        let Some(scope) = expiration.or_else(|| expirations.first().copied()) else {
            return Err(Error::NoData(format!("tradier lists no expirations for {}", symbol)));
        };
        debug!(symbol, %scope, "tradier chain");

        let date = scope.format("%Y-%m-%d").to_string();
        let url = endpoint(
            &self.base_url,
            "/v1/markets/options/chains",
            &[("symbol", symbol), ("expiration", date.as_str()), ("greeks", "false")],
        )?;
        let body: ChainEnvelope = self.http.get_json(url, &self.auth).await?;

        let mut chain = OptionChainSnapshot::empty(symbol);
        chain.expirations = expirations.into_iter().collect();
        chain.expiration = Some(scope);
        for contract in decode_chain(body) {
            chain.push(contract);
        }
        chain.sort_by_strike();
        Ok(chain)
    }

    async fn validate_token(&self) -> Result<TokenStatus, Error> {
        let url = endpoint(&self.base_url, "/v1/user/profile", &[])?;
        self.http.probe_token(url, &self.auth).await
    }
}

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Deserialize)]
struct QuotesEnvelope {
    quotes: Option<QuotesBody>,
}

#[derive(Debug, Deserialize)]
struct QuotesBody {
    quote: Option<OneOrMany<TradierQuote>>,
}

#[derive(Debug, Deserialize)]
struct TradierQuote {
    symbol: String,
    last: Option<Decimal>,
    close: Option<Decimal>,
    prevclose: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct ExpirationsEnvelope {
    expirations: Option<ExpirationsBody>,
}

#[derive(Debug, Deserialize)]
struct ExpirationsBody {
    date: Option<OneOrMany<NaiveDate>>,
}

#[derive(Debug, Deserialize)]
struct ChainEnvelope {
    options: Option<ChainBody>,
}

#[derive(Debug, Deserialize)]
struct ChainBody {
    option: Option<OneOrMany<TradierOption>>,
}

#[derive(Debug, Deserialize)]
struct TradierOption {
    symbol: Option<String>,
    option_type: Option<String>,
    strike: Option<Decimal>,
    bid: Option<Decimal>,
    ask: Option<Decimal>,
    last: Option<Decimal>,
}

fn decode_price(symbol: &str, body: QuotesEnvelope) -> Result<Decimal, Error> {
    let quotes = body
        .quotes
        .and_then(|q| q.quote)
        .map(OneOrMany::into_vec)
        .unwrap_or_default();

    quotes
        .into_iter()
        .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
        .and_then(|q| {
            [q.last, q.close, q.prevclose]
                .into_iter()
                .flatten()
                .find(|p| *p > Decimal::ZERO)
        })
        .ok_or_else(|| Error::NoData(format!("tradier has no price for {}", symbol)))
}

fn decode_expirations(body: ExpirationsEnvelope) -> Vec<NaiveDate> {
    let mut dates = body
        .expirations
        .and_then(|e| e.date)
        .map(OneOrMany::into_vec)
        .unwrap_or_default();
    dates.sort_unstable();
    dates
}

fn decode_chain(body: ChainEnvelope) -> Vec<OptionContract> {
    body.options
        .and_then(|o| o.option)
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|o| {
            let kind = o.option_type.as_deref()?.parse::<OptionKind>().ok()?;
            let mut contract = OptionContract::new(kind, o.strike?)
                .with_quote(o.bid, o.ask)
                .with_last(o.last);
            contract.contract_symbol = o.symbol;
            Some(contract)
        })
        .collect()
}
