//! Order placement against live chain snapshots.

use crate::models::{OrderPlacement, OrderRequest, PlacedOrder, PlacementStatus};
use crate::simulator;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use quote_client::{Error, OptionChainSnapshot, QuoteService};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Anything that can produce an option chain snapshot.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Chain for `symbol`, optionally pinned to `expiration`.
    ///
    /// # Errors
    /// Returns error if no source could produce a chain.
    async fn fetch_option_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot, Error>;
}

#[async_trait]
impl ChainSource for QuoteService {
    async fn fetch_option_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<OptionChainSnapshot, Error> {
        QuoteService::fetch_option_chain(self, symbol, expiration).await
    }
}

/// Places paper orders.
pub struct TradingService {
    chains: Arc<dyn ChainSource>,
}

impl TradingService {
    /// Creates a trading service reading chains from `chains`.
    #[must_use]
    pub fn new(chains: Arc<dyn ChainSource>) -> Self {
        Self { chains }
    }

    /// Evaluates `request` against the current chain for its expiration.
    ///
    /// Malformed requests are rejected without a fetch.
    ///
    /// # Errors
    /// Returns the quote error when the chain cannot be fetched.
    #[instrument(skip(self, request), fields(symbol = %request.symbol, side = %request.side))]
    pub async fn place_option_order(&self, request: &OrderRequest) -> Result<OrderPlacement, Error> {
        let id = Uuid::new_v4().to_string();

        if let Some(reason) = simulator::validate(request) {
            info!(order_id = %id, %reason, "order rejected");
            return Ok(OrderPlacement {
                placed: PlacedOrder {
                    id,
                    status: PlacementStatus::Rejected,
                    reason: Some(reason),
                },
                fill: None,
            });
        }

        let chain = self
            .chains
            .fetch_option_chain(&request.symbol, Some(request.option.expiration))
            .await?;
        let placement = simulator::evaluate(id, request, &chain, Utc::now());

        match &placement.fill {
            Some(fill) => info!(order_id = %placement.placed.id, price = %fill.price, "order filled"),
            None => info!(order_id = %placement.placed.id, "order working"),
        }
        Ok(placement)
    }
}

impl std::fmt::Debug for TradingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradingService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OptionRight, OptionSpec, OrderSide, TimeInForce};
    use parking_lot::Mutex;
    use quote_client::{OptionContract, OptionKind};
    use rust_decimal_macros::dec;

    struct FixedChain {
        chain: Result<OptionChainSnapshot, Error>,
        calls: Mutex<Vec<(String, Option<NaiveDate>)>>,
    }

    #[async_trait]
    impl ChainSource for FixedChain {
        async fn fetch_option_chain(
            &self,
            symbol: &str,
            expiration: Option<NaiveDate>,
        ) -> Result<OptionChainSnapshot, Error> {
            self.calls.lock().push((symbol.to_string(), expiration));
            self.chain.clone()
        }
    }

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 16).unwrap()
    }

    fn chain() -> OptionChainSnapshot {
        let mut chain = OptionChainSnapshot::empty("AAPL");
        chain.expiration = Some(expiry());
        chain.push(
            OptionContract::new(OptionKind::Call, dec!(190)).with_quote(Some(dec!(2.40)), Some(dec!(2.50))),
        );
        chain
    }

    fn request(limit: rust_decimal::Decimal, quantity: u32) -> OrderRequest {
        OrderRequest {
            symbol: "AAPL".to_string(),
            option: OptionSpec {
                expiration: expiry(),
                right: OptionRight::Call,
                strike: dec!(190),
            },
            side: OrderSide::Buy,
            quantity,
            limit,
            time_in_force: TimeInForce::Day,
        }
    }

    fn service(chain: Result<OptionChainSnapshot, Error>) -> (TradingService, Arc<FixedChain>) {
        let source = Arc::new(FixedChain {
            chain,
            calls: Mutex::new(Vec::new()),
        });
        (TradingService::new(source.clone()), source)
    }

    #[tokio::test]
    async fn test_fills_at_ask_and_pins_expiration() {
        let (trading, source) = service(Ok(chain()));
        let placement = trading.place_option_order(&request(dec!(2.60), 3)).await.unwrap();

        assert_eq!(placement.placed.status, PlacementStatus::Accepted);
        let fill = placement.fill.unwrap();
        assert_eq!(fill.price, dec!(2.50));
        assert_eq!(fill.quantity, 3);
        assert_eq!(source.calls.lock()[0], ("AAPL".to_string(), Some(expiry())));
    }

    #[tokio::test]
    async fn test_rejects_without_fetching() {
        let (trading, source) = service(Ok(chain()));
        let placement = trading.place_option_order(&request(dec!(2.60), 0)).await.unwrap();

        assert_eq!(placement.placed.status, PlacementStatus::Rejected);
        assert!(placement.placed.reason.is_some());
        assert!(source.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_chain_error_propagates() {
        let (trading, _) = service(Err(Error::NoData("nothing".into())));
        let result = trading.place_option_order(&request(dec!(2.60), 1)).await;
        assert!(matches!(result, Err(Error::NoData(_))));
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (trading, _) = service(Ok(chain()));
        let a = trading.place_option_order(&request(dec!(2.00), 1)).await.unwrap();
        let b = trading.place_option_order(&request(dec!(2.00), 1)).await.unwrap();
        assert!(a.fill.is_none());
        assert_ne!(a.placed.id, b.placed.id);
    }
}
