//! Quote facade: one optional provider in front of the public sources.

use crate::error::Error;
use crate::fallback::{Step, first_success};
use crate::http::HttpClient;
use crate::provider::QuoteProvider;
use crate::public::{CsvQuoteSource, PublicSourcesConfig, YahooSource};
use crate::types::{OptionChainSnapshot, TokenStatus, normalize_symbol};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument};


/// Resolves delayed prices and option chains, degrading across sources.
///
/// Price order: active provider, public quote, public chart, then each CSV
/// mirror. Chains: active provider when it returns contracts, otherwise the
/// default public source.
pub struct QuoteService {
    provider: Option<Arc<dyn QuoteProvider>>,
    default_source: Arc<dyn QuoteProvider>,
    yahoo: YahooSource,
    csv: CsvQuoteSource,
    csv_hosts: Vec<String>,
}

impl std::fmt::Debug for QuoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteService")
            .field("provider", &self.provider_name())
            .field("csv_hosts", &self.csv_hosts)
            .finish_non_exhaustive()
    }
}

impl QuoteService {
    /// Creates the facade with an optional active provider.
    #[must_use]
    pub fn new(
        http: HttpClient,
        public: &PublicSourcesConfig,
        provider: Option<Arc<dyn QuoteProvider>>,
    ) -> Self {
        let yahoo = YahooSource::new(http.clone(), &public.yahoo_base_url);
        Self {
            provider,
            default_source: Arc::new(yahoo.clone()),
            yahoo,
            csv: CsvQuoteSource::new(http),
            csv_hosts: public.csv_hosts.clone(),
        }
    }

    /// Replaces the chain source used after the provider. Defaults to Yahoo.
    #[must_use]
    pub fn with_default_chain_source(mut self, source: Arc<dyn QuoteProvider>) -> Self {
        self.default_source = source;
        self
    }

    /// Name of the active provider, if one is configured.
    #[must_use]
    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.name())
    }

    /// Checks the active provider's credentials; `None` when no provider is
    /// configured.
    pub async fn validate_provider_token(&self) -> Option<Result<TokenStatus, Error>> {
        match &self.provider {
            Some(p) => Some(p.validate_token().await),
            None => None,
        }
    }

    /// Latest delayed price of `symbol`.
    ///
    /// # Errors
    /// `InvalidSymbol` for bad input; otherwise the last source's error when
    /// every source fails.
    #[instrument(skip(self))]
    pub async fn fetch_delayed_price(&self, symbol: &str) -> Result<Decimal, Error> {
        let symbol = normalize_symbol(symbol)?;
        let symbol = symbol.as_str();

        let mut steps: Vec<Step<'_, Decimal>> = Vec::with_capacity(3 + self.csv_hosts.len());
        if let Some(provider) = &self.provider {
            steps.push(Step::new(provider.name(), provider.fetch_price(symbol)));
        }
        steps.push(Step::new("public-quote", self.yahoo.fetch_quote_price(symbol)));
        steps.push(Step::new("public-chart", self.yahoo.fetch_chart_price(symbol)));
        for host in &self.csv_hosts {
            steps.push(Step::new(
                format!("csv:{}", host),
                self.csv.fetch_price(host, symbol),
            ));
        }

        first_success(steps).await
    }

    /// Option chain for `symbol`, optionally pinned to `expiration`.
    ///
    /// # Errors
    /// `InvalidSymbol` for bad input; `NoData` when the default source lists
    /// neither contracts nor expirations; otherwise the default source's error.
    #[instrument(skip(self))]
    pub async fn fetch_option_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot, Error> {
        let symbol = normalize_symbol(symbol)?;
        let symbol = symbol.as_str();

        let mut steps: Vec<Step<'_, OptionChainSnapshot>> = Vec::with_capacity(2);
        if let Some(provider) = &self.provider {
            steps.push(Step::new(provider.name(), async move {
                let chain = provider.fetch_chain(symbol, expiration).await?;
                if chain.has_contracts() {
                    Ok(chain)
                } else {
                    Err(Error::NoData(format!(
                        "{} returned an empty chain for {}",
                        provider.name(),
                        symbol
                    )))
                }
            }));
        }
        steps.push(Step::new(
            self.default_source.name(),
            self.fetch_default_chain(symbol, expiration),
        ));

        first_success(steps).await
    }

    /// Default-source chain. Without an expiration the source may answer
    /// with expirations only; in that case the chain is re-requested pinned
    /// to the first expiration.
    async fn fetch_default_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot, Error> {
        let first = self.default_source.fetch_chain(symbol, expiration).await?;
        if first.has_contracts() {
            return Ok(first);
        }
        if first.expirations.is_empty() {
            return Err(Error::NoData(format!("no option chain listed for {}", symbol)));
        }
        if expiration.is_some() {
            return Ok(first);
        }

        let Some(pinned) = first.first_expiration() else {
            return Err(Error::NoData(format!("no option chain listed for {}", symbol)));
        };
        debug!(symbol, %pinned, "chain listed expirations only, re-requesting pinned");

        let mut second = self.default_source.fetch_chain(symbol, Some(pinned)).await?;
        if second.expirations.is_empty() {
            second.expirations = first.expirations;
        }
        if second.underlying_price.is_none() {
            second.underlying_price = first.underlying_price;
        }
        second.expiration = second.expiration.or(Some(pinned));
        Ok(second)
    }
}
