//! Keyless public quote sources used as the fallback tail.

mod csv;
mod yahoo;

pub use csv::CsvQuoteSource;
pub use yahoo::YahooSource;

use serde::Deserialize;

/// Hosts of the public sources. Defaults point at the real services.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PublicSourcesConfig {
    /// Base URL for the Yahoo quote, chart and options endpoints.
    pub yahoo_base_url: String,
    /// CSV quote mirrors, tried in order.
    pub csv_hosts: Vec<String>,
}

impl Default for PublicSourcesConfig {
    fn default() -> Self {
        Self {
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            csv_hosts: vec![
                "https://stooq.com".to_string(),
                "https://stooq.pl".to_string(),
            ],
        }
    }
}
