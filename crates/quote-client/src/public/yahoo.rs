//! Yahoo Finance public endpoints: quote, chart and options.

use crate::error::Error;
use crate::http::{Auth, HttpClient, endpoint};
use crate::provider::QuoteProvider;
use crate::types::{OptionChainSnapshot, OptionContract, OptionKind, TokenStatus};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Default keyless source for prices and chains.
#[derive(Debug, Clone)]
pub struct YahooSource {
    http: HttpClient,
    base_url: String,
}

impl YahooSource {
    /// Creates a source against `base_url`.
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Price from the quote endpoint.
    ///
    /// # Errors
    /// Transport, status and decoding errors; `NoData` when no price is set.
    pub async fn fetch_quote_price(&self, symbol: &str) -> Result<Decimal, Error> {
        let url = endpoint(&self.base_url, "/v7/finance/quote", &[("symbols", symbol)])?;
        let body: QuoteEnvelope = self.http.get_json(url, &Auth::None).await?;
        decode_quote(symbol, body)
    }

    /// Price from the chart endpoint.
    ///
    /// # Errors
    /// Transport, status and decoding errors; `NoData` when the chart is empty.
    pub async fn fetch_chart_price(&self, symbol: &str) -> Result<Decimal, Error> {
        let path = format!("/v8/finance/chart/{}", symbol);
        let url = endpoint(&self.base_url, &path, &[("range", "1d"), ("interval", "1d")])?;
        let body: ChartEnvelope = self.http.get_json(url, &Auth::None).await?;
        decode_chart(symbol, body)
    }
}

#[async_trait]
impl QuoteProvider for YahooSource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, Error> {
        self.fetch_quote_price(symbol).await
    }

    async fn fetch_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot, Error> {
        let path = format!("/v7/finance/options/{}", symbol);
        let date = expiration.map(|d| unix_midnight(d).to_string());
        let query: Vec<(&str, &str)> = date.as_deref().map(|d| ("date", d)).into_iter().collect();
        let url = endpoint(&self.base_url, &path, &query)?;
        let body: OptionsEnvelope = self.http.get_json(url, &Auth::None).await?;
        decode_options(symbol, expiration, body)
    }

    async fn validate_token(&self) -> Result<TokenStatus, Error> {
        Ok(TokenStatus::Valid)
    }
}

/// Yahoo identifies expirations by the Unix second of 00:00 UTC.
fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

fn date_from_unix(secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: Option<QuoteResponse>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: Option<String>,
    regular_market_price: Option<Decimal>,
    post_market_price: Option<Decimal>,
    regular_market_previous_close: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Option<ChartBody>,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<Decimal>,
    chart_previous_close: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<IndicatorQuote>,
}

#[derive(Debug, Deserialize)]
struct IndicatorQuote {
    #[serde(default)]
    close: Vec<Option<Decimal>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsEnvelope {
    option_chain: Option<OptionChainBody>,
}

#[derive(Debug, Deserialize)]
struct OptionChainBody {
    result: Option<Vec<OptionChainResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionChainResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    quote: Option<YahooQuote>,
    #[serde(default)]
    options: Vec<OptionsBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsBlock {
    expiration_date: Option<i64>,
    #[serde(default)]
    calls: Vec<YahooContract>,
    #[serde(default)]
    puts: Vec<YahooContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooContract {
    contract_symbol: Option<String>,
    strike: Option<Decimal>,
    bid: Option<Decimal>,
    ask: Option<Decimal>,
    last_price: Option<Decimal>,
}

impl YahooQuote {
    fn price(&self) -> Option<Decimal> {
        [
            self.regular_market_price,
            self.post_market_price,
            self.regular_market_previous_close,
        ]
        .into_iter()
        .flatten()
        .find(|p| *p > Decimal::ZERO)
    }
}

fn decode_quote(symbol: &str, body: QuoteEnvelope) -> Result<Decimal, Error> {
    body.quote_response
        .map(|r| r.result)
        .unwrap_or_default()
        .iter()
        .filter(|q| {
            q.symbol
                .as_deref()
                .is_none_or(|s| s.eq_ignore_ascii_case(symbol))
        })
        .find_map(YahooQuote::price)
        .ok_or_else(|| Error::NoData(format!("yahoo quote has no price for {}", symbol)))
}

fn decode_chart(symbol: &str, body: ChartEnvelope) -> Result<Decimal, Error> {
    let result = body
        .chart
        .and_then(|c| c.result)
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| Error::NoData(format!("yahoo chart is empty for {}", symbol)))?;

    let last_close = result
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .and_then(|q| q.close.into_iter().rev().flatten().next());
    let (market, previous) = result
        .meta
        .map(|m| (m.regular_market_price, m.chart_previous_close))
        .unwrap_or_default();

    [market, last_close, previous]
        .into_iter()
        .flatten()
        .find(|p| *p > Decimal::ZERO)
        .ok_or_else(|| Error::NoData(format!("yahoo chart has no price for {}", symbol)))
}

fn decode_options(
    symbol: &str,
    requested: Option<NaiveDate>,
    body: OptionsEnvelope,
) -> Result<OptionChainSnapshot, Error> {
    let result = body
        .option_chain
        .and_then(|c| c.result)
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| Error::NoData(format!("yahoo has no option chain for {}", symbol)))?;

    let mut chain = OptionChainSnapshot::empty(symbol);
    chain.underlying_price = result.quote.as_ref().and_then(YahooQuote::price);
    chain.expirations = result
        .expiration_dates
        .iter()
        .filter_map(|secs| date_from_unix(*secs))
        .collect();
    chain.expiration = requested;

    for block in result.options {
        if chain.expiration.is_none() {
            chain.expiration = block.expiration_date.and_then(date_from_unix);
        }
        let sides = [(OptionKind::Call, block.calls), (OptionKind::Put, block.puts)];
        for (kind, contracts) in sides {
            for c in contracts {
                let Some(strike) = c.strike else { continue };
                let mut contract = OptionContract::new(kind, strike)
                    .with_quote(c.bid, c.ask)
                    .with_last(c.last_price);
                contract.contract_symbol = c.contract_symbol;
                chain.push(contract);
            }
        }
    }
    chain.sort_by_strike();
    Ok(chain)
}
