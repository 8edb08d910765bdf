//! Stooq-style CSV quote endpoint, the last resort for underlying prices.

use crate::error::Error;
use crate::http::{Auth, HttpClient, endpoint};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// CSV quote fetcher; the host is picked per call so mirrors can be tried
/// in turn.
#[derive(Debug, Clone)]
pub struct CsvQuoteSource {
    http: HttpClient,
}

impl CsvQuoteSource {
    /// Creates a source.
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Fetches the close price for `symbol` from `host`.
    ///
    /// # Errors
    /// Transport and status errors; `Parse` for a malformed document and
    /// `NoData` when the mirror reports `N/D`.
    pub async fn fetch_price(&self, host: &str, symbol: &str) -> Result<Decimal, Error> {
        let ticker = csv_ticker(symbol);
        let url = endpoint(
            host,
            "/q/l/",
            &[("s", ticker.as_str()), ("f", "sd2t2ohlcv"), ("h", ""), ("e", "csv")],
        )?;
        let body = self.http.get_text(url, &Auth::None).await?;
        parse_close(symbol, &body)
    }
}

/// US listings carry a `.us` suffix; indices and already-qualified tickers
/// pass through lower-cased.
fn csv_ticker(symbol: &str) -> String {
    let lower = symbol.to_ascii_lowercase();
    if lower.starts_with('^') || lower.contains('.') {
        lower
    } else {
        format!("{}.us", lower)
    }
}

#[derive(Debug, Deserialize)]
struct CsvQuoteRow {
    #[serde(rename = "Close", alias = "close")]
    close: Option<String>,
}

fn parse_close(symbol: &str, body: &str) -> Result<Decimal, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| Error::Parse(format!("unreadable CSV quote: {}", e)))?;
    if !headers.iter().any(|h| h.eq_ignore_ascii_case("close")) {
        return Err(Error::Parse(format!(
            "CSV quote has no Close column: {}",
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let row: CsvQuoteRow = reader
        .deserialize()
        .next()
        .ok_or_else(|| Error::NoData(format!("CSV quote has no rows for {}", symbol)))?
        .map_err(|e| Error::Parse(format!("bad CSV row: {}", e)))?;

    let cell = match row.close.as_deref() {
        Some(cell) if !cell.is_empty() && !cell.eq_ignore_ascii_case("N/D") => cell,
        _ => return Err(Error::NoData(format!("CSV quote has no close for {}", symbol))),
    };
    let price = Decimal::from_str(cell)
        .map_err(|e| Error::Parse(format!("bad CSV close {:?}: {}", cell, e)))?;
    if price <= Decimal::ZERO {
        return Err(Error::NoData(format!("CSV quote has no close for {}", symbol)));
    }
    Ok(price)
}
