//! Order types and request/response models for the REST API.

use chrono::{DateTime, NaiveDate, Utc};
use quote_client::{OptionChainSnapshot, OptionContract, OptionKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Order Vocabulary
// ============================================================================

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy to open or close.
    Buy,
    /// Sell to open or close.
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Option right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

impl From<OptionRight> for OptionKind {
    fn from(right: OptionRight) -> Self {
        match right {
            OptionRight::Call => OptionKind::Call,
            OptionRight::Put => OptionKind::Put,
        }
    }
}

impl From<OptionKind> for OptionRight {
    fn from(kind: OptionKind) -> Self {
        match kind {
            OptionKind::Call => OptionRight::Call,
            OptionKind::Put => OptionRight::Put,
        }
    }
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

/// How long a working order stays eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Canceled if still working after the calendar day it was placed.
    #[default]
    Day,
    /// Good till canceled (or expired).
    Gtc,
}

impl std::fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Gtc => write!(f, "gtc"),
        }
    }
}

/// Lifecycle of a saved order. `Filled`, `Failed` and `Canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Resting, re-evaluated by the monitor.
    Working,
    /// Executed in full.
    Filled,
    /// Rejected at placement.
    Failed,
    /// Canceled by expiry, day rollover or the user.
    Canceled,
}

impl OrderStatus {
    /// True once the order can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Working)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Working => write!(f, "working"),
            Self::Filled => write!(f, "filled"),
            Self::Failed => write!(f, "failed"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "working" => Ok(Self::Working),
            "filled" => Ok(Self::Filled),
            "failed" => Ok(Self::Failed),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            _ => Err(format!(
                "Invalid status: {}. Use 'working', 'filled', 'failed' or 'canceled'",
                s
            )),
        }
    }
}

// ============================================================================
// Placement
// ============================================================================

/// The listed option an order refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OptionSpec {
    /// Expiration date.
    #[schema(value_type = String, example = "2026-01-16")]
    pub expiration: NaiveDate,
    /// Call or put.
    pub right: OptionRight,
    /// Strike price.
    #[schema(value_type = String, example = "190")]
    pub strike: Decimal,
}

/// A limit order to evaluate. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderRequest {
    /// Underlying symbol.
    pub symbol: String,
    /// Option to trade.
    pub option: OptionSpec,
    /// Buy or sell.
    pub side: OrderSide,
    /// Number of contracts.
    pub quantity: u32,
    /// Limit price per contract.
    #[schema(value_type = String, example = "2.50")]
    pub limit: Decimal,
    /// Time in force (default `day`).
    #[serde(default)]
    pub time_in_force: TimeInForce,
}

/// Outcome of one placement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlacementStatus {
    /// Accepted; may or may not have filled.
    Accepted,
    /// Rejected by validation.
    Rejected,
}

/// Identity and status of an evaluated order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlacedOrder {
    /// Order identifier.
    pub id: String,
    /// Accepted or rejected.
    pub status: PlacementStatus,
    /// Rejection reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A simulated execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Fill {
    /// Execution price, rounded to the cent.
    #[schema(value_type = String, example = "2.50")]
    pub price: Decimal,
    /// Filled contracts; always the full order quantity.
    pub quantity: u32,
    /// Execution time.
    pub timestamp: DateTime<Utc>,
}

/// Result of evaluating a request against a chain snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderPlacement {
    /// The evaluated order.
    pub placed: PlacedOrder,
    /// Present when the order executed immediately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
}

// ============================================================================
// Ledger Record
// ============================================================================

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SavedOrder {
    /// Order identifier.
    pub id: String,
    /// Placement time.
    pub placed_at: DateTime<Utc>,
    /// Underlying symbol.
    pub symbol: String,
    /// Expiration date.
    #[schema(value_type = String)]
    pub expiration: NaiveDate,
    /// Call or put.
    pub right: OptionRight,
    /// Strike price.
    #[schema(value_type = String)]
    pub strike: Decimal,
    /// Buy or sell.
    pub side: OrderSide,
    /// Number of contracts.
    pub quantity: u32,
    /// Limit price.
    #[schema(value_type = String)]
    pub limit: Decimal,
    /// Time in force.
    pub time_in_force: TimeInForce,
    /// Current status.
    pub status: OrderStatus,
    /// Execution price once filled.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub fill_price: Option<Decimal>,
    /// Filled contracts once filled.
    #[serde(default)]
    pub fill_quantity: Option<u32>,
    /// Free-form note (rejection or cancel reason).
    #[serde(default)]
    pub note: Option<String>,
}

impl SavedOrder {
    /// Builds the ledger record for an evaluated request.
    #[must_use]
    pub fn from_placement(
        request: &OrderRequest,
        placement: &OrderPlacement,
        placed_at: DateTime<Utc>,
    ) -> Self {
        let status = match (&placement.placed.status, &placement.fill) {
            (PlacementStatus::Rejected, _) => OrderStatus::Failed,
            (PlacementStatus::Accepted, Some(_)) => OrderStatus::Filled,
            (PlacementStatus::Accepted, None) => OrderStatus::Working,
        };

        Self {
            id: placement.placed.id.clone(),
            placed_at,
            symbol: request.symbol.trim().to_uppercase(),
            expiration: request.option.expiration,
            right: request.option.right,
            strike: request.option.strike,
            side: request.side,
            quantity: request.quantity,
            limit: request.limit,
            time_in_force: request.time_in_force,
            status,
            fill_price: placement.fill.as_ref().map(|f| f.price),
            fill_quantity: placement.fill.as_ref().map(|f| f.quantity),
            note: placement.placed.reason.clone(),
        }
    }

    /// Marks the order filled.
    pub fn mark_filled(&mut self, price: Decimal, note: &str) {
        self.status = OrderStatus::Filled;
        self.fill_price = Some(price);
        self.fill_quantity = Some(self.quantity);
        self.note = Some(note.to_string());
    }

    /// Marks the order canceled.
    pub fn mark_canceled(&mut self, note: &str) {
        self.status = OrderStatus::Canceled;
        self.note = Some(note.to_string());
    }
}

// ============================================================================
// API Responses
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Active quote provider, if any.
    pub provider: Option<String>,
    /// Monitor heartbeat classification.
    pub monitor: HeartbeatStatus,
}

/// Freshness of the monitor heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatStatus {
    /// Heartbeat within the stale threshold.
    Alive,
    /// Heartbeat older than the stale threshold.
    Stale,
    /// No heartbeat recorded.
    Never,
}

/// Delayed underlying price.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuoteResponse {
    /// Normalized symbol.
    pub symbol: String,
    /// Price.
    #[schema(value_type = String)]
    pub price: Decimal,
    /// Fetch time.
    pub fetched_at: DateTime<Utc>,
}

/// Query parameters for chain requests.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ChainQuery {
    /// Expiration to pin the chain to (`YYYY-MM-DD`).
    #[schema(value_type = Option<String>)]
    pub expiration: Option<NaiveDate>,
}

/// One contract in a chain response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContractQuote {
    /// Call or put.
    pub right: OptionRight,
    /// Strike price.
    #[schema(value_type = String)]
    pub strike: Decimal,
    /// Best bid.
    #[schema(value_type = Option<String>)]
    pub bid: Option<Decimal>,
    /// Best ask.
    #[schema(value_type = Option<String>)]
    pub ask: Option<Decimal>,
    /// Last trade.
    #[schema(value_type = Option<String>)]
    pub last: Option<Decimal>,
    /// Mid price.
    #[schema(value_type = Option<String>)]
    pub mid: Option<Decimal>,
    /// Vendor contract symbol.
    pub contract_symbol: Option<String>,
}

impl From<&OptionContract> for ContractQuote {
    fn from(c: &OptionContract) -> Self {
        Self {
            right: c.kind.into(),
            strike: c.strike,
            bid: c.bid,
            ask: c.ask,
            last: c.last,
            mid: c.mid(),
            contract_symbol: c.contract_symbol.clone(),
        }
    }
}

/// Option chain response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// Underlying symbol.
    pub symbol: String,
    /// Underlying price reported with the chain.
    #[schema(value_type = Option<String>)]
    pub underlying_price: Option<Decimal>,
    /// Listed expirations, ascending.
    #[schema(value_type = Vec<String>)]
    pub expirations: Vec<NaiveDate>,
    /// Expiration the contracts belong to.
    #[schema(value_type = Option<String>)]
    pub expiration: Option<NaiveDate>,
    /// Calls by strike.
    pub calls: Vec<ContractQuote>,
    /// Puts by strike.
    pub puts: Vec<ContractQuote>,
}

impl From<OptionChainSnapshot> for ChainResponse {
    fn from(chain: OptionChainSnapshot) -> Self {
        Self {
            calls: chain.calls.iter().map(ContractQuote::from).collect(),
            puts: chain.puts.iter().map(ContractQuote::from).collect(),
            expirations: chain.expirations.into_iter().collect(),
            expiration: chain.expiration,
            underlying_price: chain.underlying_price,
            symbol: chain.symbol,
        }
    }
}

/// Response to an order placement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlaceOrderResponse {
    /// Evaluation outcome.
    pub placement: OrderPlacement,
    /// The persisted record.
    pub order: SavedOrder,
}

/// Query parameters for listing orders.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    /// Filter by status.
    pub status: Option<String>,
}

/// Ledger listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    /// Orders in insertion order.
    pub orders: Vec<SavedOrder>,
    /// Number of orders returned.
    pub count: usize,
}

/// Response to a remove or clear.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RemovedResponse {
    /// Number of orders removed.
    pub removed: usize,
}

/// Active provider and the outcome of a credential check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderStatusResponse {
    /// Provider name; absent when running on public sources only.
    pub provider: Option<String>,
    /// Whether the vendor accepted the token; absent without a provider.
    pub token_valid: Option<bool>,
    /// Rejection reason or transport error.
    pub detail: Option<String>,
}

/// Monitor state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonitorStatusResponse {
    /// Whether the loop is running.
    pub running: bool,
    /// Heartbeat freshness.
    pub heartbeat: HeartbeatStatus,
    /// Last heartbeat instant.
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Tick interval in seconds.
    pub interval_secs: u64,
}
