//! Polygon.io client.

use super::assemble_chain;
use crate::error::Error;
use crate::http::{Auth, HttpClient, endpoint};
use crate::provider::QuoteProvider;
use crate::types::{OptionChainSnapshot, OptionContract, OptionKind, TokenStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Contracts requested per snapshot page.
const SNAPSHOT_LIMIT: &str = "250";

/// Polygon client; the key travels as the `apiKey` query parameter.
#[derive(Debug, Clone)]
pub struct PolygonProvider {
    http: HttpClient,
    base_url: String,
    auth: Auth,
}

impl PolygonProvider {
    /// Creates a client against `base_url`.
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str, token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Auth::Query {
                param: "apiKey",
                value: token,
            },
        }
    }
}

#[async_trait]
impl QuoteProvider for PolygonProvider {
    fn name(&self) -> &'static str {
        "polygon"
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, Error> {
        let path = format!("/v2/aggs/ticker/{}/prev", symbol);
        let url = endpoint(&self.base_url, &path, &[("adjusted", "true")])?;
        let body: PrevCloseEnvelope = self.http.get_json(url, &self.auth).await?;
        body.results
            .into_iter()
            .filter_map(|bar| bar.c)
            .find(|c| *c > Decimal::ZERO)
            .ok_or_else(|| Error::NoData(format!("polygon has no previous close for {}", symbol)))
    }

    async fn fetch_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot, Error> {
        let path = format!("/v3/snapshot/options/{}", symbol);
        let date = expiration.map(|d| d.format("%Y-%m-%d").to_string());
        let mut query = vec![("limit", SNAPSHOT_LIMIT)];
        if let Some(date) = date.as_deref() {
            query.push(("expiration_date", date));
        }
        let url = endpoint(&self.base_url, &path, &query)?;
        let body: SnapshotEnvelope = self.http.get_json(url, &self.auth).await?;
        Ok(decode_snapshot(symbol, expiration, body))
    }

    async fn validate_token(&self) -> Result<TokenStatus, Error> {
        let url = endpoint(&self.base_url, "/v1/marketstatus/now", &[])?;
        self.http.probe_token(url, &self.auth).await
    }
}

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Deserialize)]
struct PrevCloseEnvelope {
    #[serde(default)]
    results: Vec<AggregateBar>,
}

#[derive(Debug, Deserialize)]
struct AggregateBar {
    c: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct SnapshotEnvelope {
    #[serde(default)]
    results: Vec<SnapshotResult>,
}

#[derive(Debug, Deserialize)]
struct SnapshotResult {
    details: Option<ContractDetails>,
    last_quote: Option<LastQuote>,
    last_trade: Option<LastTrade>,
    day: Option<DayBar>,
    underlying_asset: Option<UnderlyingAsset>,
}

#[derive(Debug, Deserialize)]
struct ContractDetails {
    contract_type: Option<String>,
    strike_price: Option<Decimal>,
    expiration_date: Option<NaiveDate>,
    ticker: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LastQuote {
    bid: Option<Decimal>,
    ask: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct LastTrade {
    price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct DayBar {
    close: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct UnderlyingAsset {
    price: Option<Decimal>,
}

fn decode_snapshot(
    symbol: &str,
    requested: Option<NaiveDate>,
    body: SnapshotEnvelope,
) -> OptionChainSnapshot {
    let underlying = body
        .results
        .iter()
        .find_map(|r| r.underlying_asset.as_ref().and_then(|u| u.price));

    let contracts = body
        .results
        .into_iter()
        .filter_map(|r| {
            let details = r.details?;
            let kind = details.contract_type?.parse::<OptionKind>().ok()?;
            let expiration = details.expiration_date?;
            let (bid, ask) = r.last_quote.map(|q| (q.bid, q.ask)).unwrap_or_default();
            let last = r
                .last_trade
                .and_then(|t| t.price)
                .or_else(|| r.day.and_then(|d| d.close));

            let mut contract = OptionContract::new(kind, details.strike_price?)
                .with_quote(bid, ask)
                .with_last(last);
            contract.contract_symbol = details.ticker;
            Some((expiration, contract))
        })
        .collect();

    assemble_chain(symbol, requested, underlying, contracts)
}
