//! Bring-your-own-key vendor clients and the manual provider.

mod alpaca;
mod alpha_vantage;
mod finnhub;
mod manual;
mod polygon;
mod tradier;

pub use alpaca::AlpacaProvider;
pub use alpha_vantage::AlphaVantageProvider;
pub use finnhub::FinnhubProvider;
pub use manual::ManualProvider;
pub use polygon::PolygonProvider;
pub use tradier::TradierProvider;

use crate::error::Error;
use crate::http::HttpClient;
use crate::provider::{ProviderKind, QuoteProvider};
use crate::public::{PublicSourcesConfig, YahooSource};
use crate::types::{OptionChainSnapshot, OptionContract};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

/// Vendors answer with either a single object or a list depending on how
/// many results matched.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

/// Builds a chain snapshot from contracts tagged with their expiration.
///
/// The snapshot lists every expiration seen and keeps only the contracts of
/// `requested`, or of the earliest expiration when none is requested.
pub(crate) fn assemble_chain(
    symbol: &str,
    requested: Option<NaiveDate>,
    underlying_price: Option<Decimal>,
    contracts: Vec<(NaiveDate, OptionContract)>,
) -> OptionChainSnapshot {
    let mut chain = OptionChainSnapshot::empty(symbol);
    chain.underlying_price = underlying_price;
    chain.expirations = contracts.iter().map(|(date, _)| *date).collect();
    let scope = requested.or_else(|| chain.first_expiration());
    chain.expiration = scope;

    for (date, contract) in contracts {
        if Some(date) == scope {
            chain.push(contract);
        }
    }
    chain.sort_by_strike();
    chain
}

/// Overrides for vendor base URLs, mostly for tests and proxies.
#[derive(Debug, Clone, Default)]
pub struct VendorEndpoints {
    /// Replaces the vendor's default base URL when set.
    pub base_url: Option<String>,
}

/// Builds the provider for `kind`.
///
/// `token` is ignored by the public and manual providers.
///
/// # Errors
/// `Unauthorized` when a vendor that needs a key gets none, or the key is
/// malformed (Alpaca expects `KEY:SECRET`).
pub fn build_provider(
    kind: ProviderKind,
    token: Option<String>,
    http: HttpClient,
    endpoints: &VendorEndpoints,
    public: &PublicSourcesConfig,
) -> Result<Arc<dyn QuoteProvider>, Error> {
    let token = match (kind.requires_token(), token) {
        (true, Some(token)) if !token.trim().is_empty() => token.trim().to_string(),
        (true, _) => {
            return Err(Error::Unauthorized(format!("no token configured for {}", kind)));
        }
        (false, _) => String::new(),
    };
    let base = endpoints.base_url.clone();

    let provider: Arc<dyn QuoteProvider> = match kind {
        ProviderKind::Tradier => Arc::new(TradierProvider::new(
            http,
            base.as_deref().unwrap_or(tradier::DEFAULT_BASE_URL),
            token,
        )),
        ProviderKind::Polygon => Arc::new(PolygonProvider::new(
            http,
            base.as_deref().unwrap_or(polygon::DEFAULT_BASE_URL),
            token,
        )),
        ProviderKind::Alpaca => Arc::new(AlpacaProvider::new(
            http,
            base.as_deref().unwrap_or(alpaca::DEFAULT_BASE_URL),
            &token,
        )?),
        ProviderKind::Finnhub => Arc::new(FinnhubProvider::new(
            http,
            base.as_deref().unwrap_or(finnhub::DEFAULT_BASE_URL),
            token,
        )),
        ProviderKind::AlphaVantage => Arc::new(AlphaVantageProvider::new(
            http,
            base.as_deref().unwrap_or(alpha_vantage::DEFAULT_BASE_URL),
            token,
        )),
        ProviderKind::Manual => Arc::new(ManualProvider::new()),
        ProviderKind::Yahoo => Arc::new(YahooSource::new(
            http,
            base.as_deref().unwrap_or(&public.yahoo_base_url),
        )),
    };
    Ok(provider)
}
