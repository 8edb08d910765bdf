//! Delayed equity prices and option chains from unreliable sources.
//!
//! This crate puts five bring-your-own-key vendors (Tradier, Polygon, Alpaca,
//! Finnhub, Alpha Vantage), a manual book and the keyless Yahoo endpoints
//! behind one [`QuoteProvider`] trait, and a [`QuoteService`] that falls back
//! from the configured provider to the public sources.
//!
//! # Example
//!
//! ```no_run
//! use quote_client::{HttpClient, PublicSourcesConfig, QuoteService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), quote_client::Error> {
//!     let http = HttpClient::with_defaults()?;
//!     let quotes = QuoteService::new(http, &PublicSourcesConfig::default(), None);
//!
//!     let price = quotes.fetch_delayed_price("AAPL").await?;
//!     println!("AAPL: {}", price);
//!
//!     let chain = quotes.fetch_option_chain("AAPL", None).await?;
//!     println!("{} calls, {} puts", chain.calls.len(), chain.puts.len());
//!
//!     Ok(())
//! }
//! ```

mod error;
mod fallback;
mod http;
mod occ;
mod provider;
mod public;
mod service;
mod types;
mod vendors;

pub use error::Error;
pub use fallback::{Step, first_success};
pub use http::{Auth, DEFAULT_TIMEOUT, HttpClient, HttpConfig};
pub use occ::OccSymbol;
pub use provider::{ProviderKind, QuoteProvider};
pub use public::{CsvQuoteSource, PublicSourcesConfig, YahooSource};
pub use service::QuoteService;
pub use types::*;
pub use vendors::{
    AlpacaProvider, AlphaVantageProvider, FinnhubProvider, ManualProvider, PolygonProvider,
    TradierProvider, VendorEndpoints, build_provider,
};
