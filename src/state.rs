//! Application state management.

use crate::config::Config;
use crate::ledger::OrderLedger;
use crate::monitor::OrderMonitor;
use crate::secrets::{SecretStore, provider_from_config};
use crate::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
use crate::trading::{ChainSource, TradingService};
use quote_client::{HttpClient, QuoteService};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors raised while wiring the services together.
#[derive(Debug, Error)]
pub enum StateError {
    /// The HTTP client could not be built.
    #[error("cannot build HTTP client: {0}")]
    Http(#[from] quote_client::Error),
    /// The configured store could not be opened.
    #[error("cannot open storage: {0}")]
    Storage(#[from] StorageError),
}

/// Application state shared across all handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Quote facade.
    pub quotes: Arc<QuoteService>,
    /// Order placement.
    pub trading: Arc<TradingService>,
    /// Persisted orders.
    pub ledger: Arc<OrderLedger>,
    /// Working-order monitor.
    pub monitor: Arc<OrderMonitor>,
}

impl AppState {
    /// Wires the services from already-built parts. The monitor is left
    /// stopped.
    #[must_use]
    pub fn new(config: Config, quotes: QuoteService, store: Arc<dyn KeyValueStore>) -> Self {
        let quotes = Arc::new(quotes);
        let chains: Arc<dyn ChainSource> = quotes.clone();
        let ledger = Arc::new(OrderLedger::new(Arc::clone(&store)));
        let trading = Arc::new(TradingService::new(Arc::clone(&chains)));
        let monitor = Arc::new(OrderMonitor::new(
            Arc::clone(&ledger),
            chains,
            store,
            config.monitor.clone(),
        ));

        Self {
            config,
            quotes,
            trading,
            ledger,
            monitor,
        }
    }

    /// Builds the state described by `config`, reading the provider token
    /// from `secrets`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built or the file store
    /// cannot be opened.
    pub fn from_config(config: Config, secrets: &dyn SecretStore) -> Result<Self, StateError> {
        let http = HttpClient::new(&config.quotes.http())?;
        let provider = provider_from_config(&config.quotes, secrets, &http);
        let quotes = QuoteService::new(http, &config.quotes.public, provider);

        let store: Arc<dyn KeyValueStore> = match &config.storage.path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => {
                info!("no storage path configured, orders are kept in memory");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::new(config, quotes, store))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("quotes", &self.quotes)
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MemorySecretStore;

    #[tokio::test]
    async fn test_default_config_runs_in_memory() {
        let state = AppState::from_config(Config::default(), &MemorySecretStore::new()).unwrap();
        assert!(state.quotes.provider_name().is_none());
        assert!(!state.monitor.is_running());
        assert!(state.ledger.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_storage_is_opened() {
        let dir = std::env::temp_dir().join(format!("paper-desk-state-{}", uuid::Uuid::new_v4()));
        let mut config = Config::default();
        config.storage.path = Some(dir.join("desk.json"));

        let state = AppState::from_config(config, &MemorySecretStore::new()).unwrap();
        assert!(state.ledger.clear().is_ok());

        let _ = std::fs::remove_dir_all(dir);
    }
}
