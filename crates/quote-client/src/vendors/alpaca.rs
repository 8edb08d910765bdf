//! Alpaca market data client.
//!
//! Option snapshots are keyed by OCC symbol; the chain is rebuilt by decoding
//! each key and silently skipping the ones that do not decode.

use super::assemble_chain;
use crate::error::Error;
use crate::http::{Auth, HttpClient, endpoint};
use crate::occ::OccSymbol;
use crate::provider::QuoteProvider;
use crate::types::{OptionChainSnapshot, OptionContract, TokenStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::trace;

pub(crate) const DEFAULT_BASE_URL: &str = "https://data.alpaca.markets";

/// Alpaca client; the token is stored as `KEY:SECRET`.
#[derive(Debug, Clone)]
pub struct AlpacaProvider {
    http: HttpClient,
    base_url: String,
    auth: Auth,
}

impl AlpacaProvider {
    /// Creates a client against `base_url`.
    ///
    /// # Errors
    /// Returns `Unauthorized` if `token` is not of the form `KEY:SECRET`.
    pub fn new(http: HttpClient, base_url: &str, token: &str) -> Result<Self, Error> {
        let (key, secret) = token
            .split_once(':')
            .filter(|(k, s)| !k.is_empty() && !s.is_empty())
            .ok_or_else(|| Error::Unauthorized("alpaca token must be KEY:SECRET".to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Auth::Headers(vec![
                ("APCA-API-KEY-ID", key.to_string()),
                ("APCA-API-SECRET-KEY", secret.to_string()),
            ]),
        })
    }
}

#[async_trait]
impl QuoteProvider for AlpacaProvider {
    fn name(&self) -> &'static str {
        "alpaca"
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, Error> {
        let path = format!("/v2/stocks/{}/trades/latest", symbol);
        let url = endpoint(&self.base_url, &path, &[])?;
        let body: LatestTradeEnvelope = self.http.get_json(url, &self.auth).await?;
        body.trade
            .and_then(|t| t.p)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| Error::NoData(format!("alpaca has no trade for {}", symbol)))
    }

    async fn fetch_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot, Error> {
        let path = format!("/v1beta1/options/snapshots/{}", symbol);
        let date = expiration.map(|d| d.format("%Y-%m-%d").to_string());
        let mut query = vec![("feed", "indicative"), ("limit", "1000")];
        if let Some(date) = date.as_deref() {
            query.push(("expiration_date", date));
        }
        let url = endpoint(&self.base_url, &path, &query)?;
        let body: SnapshotsEnvelope = self.http.get_json(url, &self.auth).await?;
        Ok(decode_snapshots(symbol, expiration, body))
    }

    async fn validate_token(&self) -> Result<TokenStatus, Error> {
        let url = endpoint(&self.base_url, "/v2/stocks/SPY/trades/latest", &[])?;
        self.http.probe_token(url, &self.auth).await
    }
}

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Deserialize)]
struct LatestTradeEnvelope {
    trade: Option<Trade>,
}

#[derive(Debug, Deserialize)]
struct Trade {
    p: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct SnapshotsEnvelope {
    #[serde(default)]
    snapshots: HashMap<String, Snapshot>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(rename = "latestQuote")]
    latest_quote: Option<Quote>,
    #[serde(rename = "latestTrade")]
    latest_trade: Option<Trade>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    bp: Option<Decimal>,
    ap: Option<Decimal>,
}

fn decode_snapshots(
    symbol: &str,
    requested: Option<NaiveDate>,
    body: SnapshotsEnvelope,
) -> OptionChainSnapshot {
    let contracts = body
        .snapshots
        .into_iter()
        .filter_map(|(occ, snapshot)| {
            let decoded = match OccSymbol::parse(&occ) {
                Ok(decoded) => decoded,
                Err(e) => {
                    trace!(error = %e, "skipping snapshot");
                    return None;
                }
            };
            if !decoded.root.eq_ignore_ascii_case(symbol) {
                return None;
            }
            let (bid, ask) = snapshot
                .latest_quote
                .map(|q| (q.bp, q.ap))
                .unwrap_or_default();
            let mut contract = OptionContract::new(decoded.kind, decoded.strike)
                .with_quote(bid, ask)
                .with_last(snapshot.latest_trade.and_then(|t| t.p));
            contract.contract_symbol = Some(occ);
            Some((decoded.expiration, contract))
        })
        .collect();

    assemble_chain(symbol, requested, None, contracts)
}
