//! # Options Paper Desk - REST API Server
//!
//! A paper-trading backend for listed equity options. Prices and option
//! chains come from the [`quote_client`] crate, which falls back from a
//! bring-your-own-key vendor to public sources; limit orders are simulated
//! against those chains, saved to a ledger, and re-evaluated in the
//! background until they fill, expire, or are canceled.
//! Built with [Axum](https://crates.io/crates/axum) for async HTTP handling and
//! provides OpenAPI/Swagger documentation via [utoipa](https://crates.io/crates/utoipa).
//!
//! ## Key Features
//!
//! - **Quote Fallback**: One optional vendor (Tradier, Polygon, Alpaca, Finnhub,
//!   Alpha Vantage or manual entry) in front of the public quote, chart and CSV
//!   sources.
//!
//! - **Paper Execution**: Buy limits fill at the ask, sell limits at the bid,
//!   rounded to the cent; the mid stands in for a missing side.
//!
//! - **Order Ledger**: Orders persist as one JSON document and every change is
//!   broadcast over WebSocket.
//!
//! - **Order Monitor**: A background loop fills crossing orders, cancels
//!   expired and stale day orders, and records a heartbeat.
//!
//! - **OpenAPI Documentation**: Auto-generated Swagger UI at `/swagger-ui/`.
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Route handlers and router configuration |
//! | [`config`] | TOML configuration |
//! | [`error`] | API error types with `IntoResponse` implementation |
//! | [`ledger`] | Persistent order ledger with change events |
//! | [`models`] | Order vocabulary and request/response DTOs |
//! | [`monitor`] | Background re-evaluation of working orders |
//! | [`secrets`] | Provider token lookup |
//! | [`simulator`] | Pure limit-order crossing logic |
//! | [`state`] | Application state management |
//! | [`storage`] | Key-value persistence |
//! | [`trading`] | Order placement against live chains |
//!
//! ## API Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/health` | Health check with monitor heartbeat |
//! | GET | `/api/v1/quotes/{symbol}` | Delayed underlying price |
//! | GET | `/api/v1/chains/{symbol}?expiration=YYYY-MM-DD` | Option chain |
//! | GET | `/api/v1/provider` | Active provider and token check |
//! | POST | `/api/v1/orders` | Place and save an order |
//! | GET | `/api/v1/orders?status=working` | List saved orders |
//! | GET | `/api/v1/orders/{id}` | Get a saved order |
//! | DELETE | `/api/v1/orders/{id}` | Remove a saved order |
//! | DELETE | `/api/v1/orders` | Clear the ledger |
//! | GET | `/api/v1/monitor` | Monitor state |
//! | POST | `/api/v1/monitor/start` | Start the monitor |
//! | POST | `/api/v1/monitor/stop` | Stop the monitor |
//! | GET | `/ws` | Ledger change stream |
//!
//! ## Example Usage
//!
//! ```bash
//! # Public sources only, orders in memory
//! cargo run
//!
//! # Polygon as the active provider
//! DESK_QUOTE_POLYGON_TOKEN=... DESK_CONFIG=desk.toml cargo run
//!
//! # Buy one AAPL call
//! curl -X POST http://localhost:8080/api/v1/orders \
//!   -H "Content-Type: application/json" \
//!   -d '{"symbol":"AAPL","option":{"expiration":"2026-01-16","right":"call","strike":"190"},
//!        "side":"buy","quantity":1,"limit":"2.60"}'
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod monitor;
pub mod secrets;
pub mod simulator;
pub mod state;
pub mod storage;
pub mod trading;
