//! The quote provider capability and the closed set of provider kinds.

use crate::error::Error;
use crate::types::{OptionChainSnapshot, TokenStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A source of delayed underlying prices and option chains.
///
/// Symbols handed to a provider are already normalized.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Latest delayed price of the underlying.
    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, Error>;

    /// Option chain for the underlying. Without an expiration the provider
    /// returns the earliest listed expiration's contracts, or just the list
    /// of expirations when it cannot do better.
    async fn fetch_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot, Error>;

    /// Checks the configured credentials with one authorized request.
    async fn validate_token(&self) -> Result<TokenStatus, Error>;
}

/// Every provider the desk knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Tradier brokerage market data.
    Tradier,
    /// Polygon.io.
    Polygon,
    /// Alpaca market data.
    Alpaca,
    /// Finnhub.
    Finnhub,
    /// Alpha Vantage.
    AlphaVantage,
    /// User-entered quotes.
    Manual,
    /// Yahoo Finance public endpoints.
    Yahoo,
}

impl ProviderKind {
    /// Stable identifier used in config files and secret keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tradier => "tradier",
            Self::Polygon => "polygon",
            Self::Alpaca => "alpaca",
            Self::Finnhub => "finnhub",
            Self::AlphaVantage => "alpha_vantage",
            Self::Manual => "manual",
            Self::Yahoo => "yahoo",
        }
    }

    /// True for vendors that need a user-supplied key.
    #[must_use]
    pub fn requires_token(&self) -> bool {
        !matches!(self, Self::Manual | Self::Yahoo)
    }

    /// Key under which the vendor token lives in the secret store.
    #[must_use]
    pub fn secret_key(&self) -> String {
        format!("quote.{}.token", self.as_str())
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "tradier" => Ok(Self::Tradier),
            "polygon" => Ok(Self::Polygon),
            "alpaca" => Ok(Self::Alpaca),
            "finnhub" => Ok(Self::Finnhub),
            "alpha_vantage" | "alphavantage" => Ok(Self::AlphaVantage),
            "manual" => Ok(Self::Manual),
            "yahoo" => Ok(Self::Yahoo),
            other => Err(Error::Unsupported(format!("unknown provider: {}", other))),
        }
    }
}
