//! User-entered quotes.

use crate::error::Error;
use crate::occ::OccSymbol;
use crate::provider::QuoteProvider;
use crate::types::{OptionChainSnapshot, OptionContract, TokenStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
struct ManualBook {
    prices: HashMap<String, Decimal>,
    chains: HashMap<String, BTreeMap<NaiveDate, Vec<OptionContract>>>,
}

/// Provider backed by prices and contracts a user typed in.
#[derive(Debug, Default)]
pub struct ManualProvider {
    book: RwLock<ManualBook>,
}

impl ManualProvider {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the underlying price for `symbol`.
    pub fn set_price(&self, symbol: &str, price: Decimal) {
        self.book
            .write()
            .prices
            .insert(symbol.to_ascii_uppercase(), price);
    }

    /// Replaces the contracts listed for `(symbol, expiration)`.
    pub fn set_contracts(&self, symbol: &str, expiration: NaiveDate, contracts: Vec<OptionContract>) {
        let symbol = symbol.to_ascii_uppercase();
        let contracts = contracts
            .into_iter()
            .map(|mut c| {
                if c.contract_symbol.is_none() {
                    let occ = OccSymbol {
                        root: symbol.clone(),
                        expiration,
                        kind: c.kind,
                        strike: c.strike,
                    };
                    c.contract_symbol = Some(occ.to_string());
                }
                c
            })
            .collect();
        self.book
            .write()
            .chains
            .entry(symbol)
            .or_default()
            .insert(expiration, contracts);
    }

    /// Forgets everything entered for `symbol`.
    pub fn clear(&self, symbol: &str) {
        let symbol = symbol.to_ascii_uppercase();
        let mut book = self.book.write();
        book.prices.remove(&symbol);
        book.chains.remove(&symbol);
    }
}

#[async_trait]
impl QuoteProvider for ManualProvider {
    fn name(&self) -> &'static str {
        "manual"
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, Error> {
        self.book
            .read()
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| Error::NoData(format!("no manual price entered for {}", symbol)))
    }

    async fn fetch_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot, Error> {
        let book = self.book.read();
        let Some(by_expiration) = book.chains.get(symbol) else {
            return Err(Error::Unsupported(format!(
                "no manual chain entered for {}",
                symbol
            )));
        };

        let mut chain = OptionChainSnapshot::empty(symbol);
        chain.underlying_price = book.prices.get(symbol).copied();
        chain.expirations = by_expiration.keys().copied().collect();
        chain.expiration = expiration.or_else(|| chain.first_expiration());
        if let Some(scope) = chain.expiration
            && let Some(contracts) = by_expiration.get(&scope)
        {
            for contract in contracts {
                chain.push(contract.clone());
            }
        }
        chain.sort_by_strike();
        Ok(chain)
    }

    async fn validate_token(&self) -> Result<TokenStatus, Error> {
        Ok(TokenStatus::Valid)
    }
}
