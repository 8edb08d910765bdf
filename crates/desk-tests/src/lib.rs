//! Integration test support for the Options Paper Desk.
//!
//! Tests never touch the network: every quote source is replaced by a local
//! axum fixture bound to `127.0.0.1:0`, and the desk itself is served the
//! same way so tests can drive its REST API with a plain HTTP client.

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use chrono::NaiveDate;
use options_paper_desk::api::create_router;
use options_paper_desk::config::Config;
use options_paper_desk::state::AppState;
use options_paper_desk::storage::MemoryStore;
use parking_lot::Mutex;
use quote_client::{HttpClient, HttpConfig, PublicSourcesConfig, QuoteService};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Address nothing listens on; requests to it fail fast.
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

/// An HTTP server on an ephemeral port that records every request URI.
pub struct FixtureServer {
    base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl FixtureServer {
    /// Serves `router` until the fixture is dropped.
    ///
    /// # Panics
    /// Panics if no local port can be bound.
    pub async fn start(router: Router) -> Self {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&hits);
        let app = router.layer(middleware::from_fn(move |req: Request, next: Next| {
            let recorder = Arc::clone(&recorder);
            async move {
                recorder.lock().push(req.uri().to_string());
                next.run(req).await
            }
        }));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fixture listener");
        let addr = listener.local_addr().expect("fixture address");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
            task,
        }
    }

    /// Base URL, without a trailing slash.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Request URIs (path and query) in arrival order.
    #[must_use]
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().clone()
    }

    /// Request paths in arrival order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.hits()
            .into_iter()
            .map(|uri| uri.split('?').next().unwrap_or_default().to_string())
            .collect()
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A desk server bound to an ephemeral port.
pub struct DeskServer {
    /// Base URL of the REST API.
    pub base_url: String,
    /// The state behind the router.
    pub state: Arc<AppState>,
    task: JoinHandle<()>,
}

impl DeskServer {
    /// Serves a desk whose public sources point at `public`, with no
    /// provider and an in-memory store.
    pub async fn start(public: PublicSourcesConfig) -> Self {
        Self::start_with(public, None).await
    }

    /// Like [`DeskServer::start`], with `provider` in front of the public
    /// sources.
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be built or no port can be bound.
    pub async fn start_with(
        public: PublicSourcesConfig,
        provider: Option<Arc<dyn quote_client::QuoteProvider>>,
    ) -> Self {
        let mut config = Config::default();
        config.monitor.autostart = false;
        config.quotes.public = public.clone();

        let quotes = QuoteService::new(test_http(), &public, provider);
        let state = Arc::new(AppState::new(config, quotes, Arc::new(MemoryStore::new())));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind desk listener");
        let addr = listener.local_addr().expect("desk address");
        let app = create_router(Arc::clone(&state));
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            task,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for DeskServer {
    fn drop(&mut self) {
        self.state.monitor.stop();
        self.task.abort();
    }
}

/// HTTP client with a short timeout for fixture traffic.
///
/// # Panics
/// Panics if the client cannot be built.
#[must_use]
pub fn test_http() -> HttpClient {
    HttpClient::new(&HttpConfig {
        timeout: Duration::from_secs(5),
        ..HttpConfig::default()
    })
    .expect("build HTTP client")
}

/// Public source configuration pointing at fixtures.
#[must_use]
pub fn public_sources(yahoo: &str, csv_hosts: &[&str]) -> PublicSourcesConfig {
    PublicSourcesConfig {
        yahoo_base_url: yahoo.to_string(),
        csv_hosts: csv_hosts.iter().map(|h| h.to_string()).collect(),
    }
}

// ============================================================================
// Yahoo-shaped bodies
// ============================================================================

/// Seconds since the epoch of 00:00 UTC on `date`.
#[must_use]
pub fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

/// Quote endpoint body.
#[must_use]
pub fn yahoo_quote(symbol: &str, price: f64) -> Value {
    json!({
        "quoteResponse": {
            "result": [{"symbol": symbol, "regularMarketPrice": price}],
            "error": null
        }
    })
}

/// Chart endpoint body.
#[must_use]
pub fn yahoo_chart(price: f64) -> Value {
    json!({
        "chart": {
            "result": [{
                "meta": {"regularMarketPrice": price},
                "indicators": {"quote": [{"close": [price]}]}
            }],
            "error": null
        }
    })
}

/// One contract in an options body.
#[must_use]
pub fn yahoo_contract(strike: f64, bid: f64, ask: f64) -> Value {
    json!({"strike": strike, "bid": bid, "ask": ask, "lastPrice": (bid + ask) / 2.0})
}

/// Options endpoint body listing `expirations`, with contracts for
/// `expiration` when `calls` or `puts` is non-empty.
#[must_use]
pub fn yahoo_options(
    symbol: &str,
    underlying: f64,
    expirations: &[NaiveDate],
    expiration: NaiveDate,
    calls: Vec<Value>,
    puts: Vec<Value>,
) -> Value {
    let options = if calls.is_empty() && puts.is_empty() {
        json!([])
    } else {
        json!([{
            "expirationDate": unix_midnight(expiration),
            "calls": calls,
            "puts": puts
        }])
    };

    json!({
        "optionChain": {
            "result": [{
                "underlyingSymbol": symbol,
                "expirationDates": expirations.iter().map(|d| unix_midnight(*d)).collect::<Vec<_>>(),
                "quote": {"symbol": symbol, "regularMarketPrice": underlying},
                "options": options
            }],
            "error": null
        }
    })
}

/// CSV quote body with `close` in the Close column.
#[must_use]
pub fn csv_quote(ticker: &str, close: &str) -> String {
    format!(
        "Symbol,Date,Time,Open,High,Low,Close,Volume\n{},2026-01-09,22:00:00,1,1,1,{},1000\n",
        ticker.to_uppercase(),
        close
    )
}
