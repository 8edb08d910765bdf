//! API request handlers.

use crate::error::ApiError;
use crate::models::{
    ChainQuery, ChainResponse, HealthResponse, MonitorStatusResponse, OrderListQuery,
    OrderListResponse, OrderRequest, OrderStatus, PlaceOrderResponse, ProviderStatusResponse,
    QuoteResponse, RemovedResponse, SavedOrder,
};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use quote_client::{TokenStatus, normalize_symbol};
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.quotes.provider_name().map(str::to_string),
        monitor: state.monitor.heartbeat_status(Utc::now()),
    })
}

// ============================================================================
// Quotes
// ============================================================================

/// Get the delayed price of an underlying.
#[utoipa::path(
    get,
    path = "/api/v1/quotes/{symbol}",
    params(
        ("symbol" = String, Path, description = "Underlying symbol")
    ),
    responses(
        (status = 200, description = "Delayed price", body = QuoteResponse),
        (status = 400, description = "Invalid symbol"),
        (status = 404, description = "No source had a price"),
        (status = 502, description = "Every source failed")
    ),
    tag = "Quotes"
)]
pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let symbol = normalize_symbol(&symbol)?;
    let price = state.quotes.fetch_delayed_price(&symbol).await?;

    Ok(Json(QuoteResponse {
        symbol,
        price,
        fetched_at: Utc::now(),
    }))
}

/// Get an option chain snapshot.
#[utoipa::path(
    get,
    path = "/api/v1/chains/{symbol}",
    params(
        ("symbol" = String, Path, description = "Underlying symbol"),
        ("expiration" = Option<String>, Query, description = "Expiration date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Chain snapshot", body = ChainResponse),
        (status = 400, description = "Invalid symbol"),
        (status = 404, description = "No chain listed"),
        (status = 502, description = "Every source failed")
    ),
    tag = "Quotes"
)]
pub async fn get_chain(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<ChainQuery>,
) -> Result<Json<ChainResponse>, ApiError> {
    let chain = state
        .quotes
        .fetch_option_chain(&symbol, query.expiration)
        .await?;
    Ok(Json(chain.into()))
}

/// Check the active provider's credentials.
#[utoipa::path(
    get,
    path = "/api/v1/provider",
    responses(
        (status = 200, description = "Provider status", body = ProviderStatusResponse)
    ),
    tag = "Quotes"
)]
pub async fn get_provider_status(State(state): State<Arc<AppState>>) -> Json<ProviderStatusResponse> {
    let provider = state.quotes.provider_name().map(str::to_string);
    let (token_valid, detail) = match state.quotes.validate_provider_token().await {
        None => (None, None),
        Some(Ok(TokenStatus::Valid)) => (Some(true), None),
        Some(Ok(TokenStatus::Invalid { reason })) => (Some(false), Some(reason)),
        Some(Err(e)) => (None, Some(e.to_string())),
    };

    Json(ProviderStatusResponse {
        provider,
        token_valid,
        detail,
    })
}

// ============================================================================
// Orders
// ============================================================================

/// Place a paper order.
///
/// The order is evaluated against the current chain and the resulting record
/// is saved, whether it filled, is working, or was rejected.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = OrderRequest,
    responses(
        (status = 201, description = "Order evaluated and saved", body = PlaceOrderResponse),
        (status = 400, description = "Invalid symbol"),
        (status = 404, description = "No chain listed"),
        (status = 502, description = "Chain unavailable")
    ),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>), ApiError> {
    let placement = state.trading.place_option_order(&request).await?;
    let order = SavedOrder::from_placement(&request, &placement, Utc::now());
    state.ledger.append(order.clone())?;

    info!(order_id = %order.id, status = %order.status, "order saved");
    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse { placement, order }),
    ))
}

/// List saved orders.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(
        ("status" = Option<String>, Query, description = "Filter by status (working, filled, failed, canceled)")
    ),
    responses(
        (status = 200, description = "Saved orders", body = OrderListResponse),
        (status = 400, description = "Unknown status")
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(ApiError::InvalidRequest)?;

    let orders: Vec<SavedOrder> = state
        .ledger
        .load()?
        .into_iter()
        .filter(|o| status.is_none_or(|s| o.status == s))
        .collect();

    Ok(Json(OrderListResponse {
        count: orders.len(),
        orders,
    }))
}

/// Get a saved order.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_id}",
    params(
        ("order_id" = String, Path, description = "Order identifier")
    ),
    responses(
        (status = 200, description = "Saved order", body = SavedOrder),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<SavedOrder>, ApiError> {
    state
        .ledger
        .get(&order_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("order {}", order_id)))
}

/// Remove a saved order.
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{order_id}",
    params(
        ("order_id" = String, Path, description = "Order identifier")
    ),
    responses(
        (status = 200, description = "Order removed", body = RemovedResponse),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<RemovedResponse>, ApiError> {
    if !state.ledger.remove(&order_id)? {
        return Err(ApiError::NotFound(format!("order {}", order_id)));
    }
    Ok(Json(RemovedResponse { removed: 1 }))
}

/// Remove every saved order.
#[utoipa::path(
    delete,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "Ledger cleared", body = RemovedResponse)
    ),
    tag = "Orders"
)]
pub async fn clear_orders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let removed = state.ledger.clear()?;
    info!(removed, "ledger cleared");
    Ok(Json(RemovedResponse { removed }))
}

// ============================================================================
// Monitor
// ============================================================================

fn monitor_status(state: &AppState) -> MonitorStatusResponse {
    MonitorStatusResponse {
        running: state.monitor.is_running(),
        heartbeat: state.monitor.heartbeat_status(Utc::now()),
        last_heartbeat: state.monitor.last_heartbeat(),
        interval_secs: state.monitor.config().interval_secs,
    }
}

/// Get the order monitor state.
#[utoipa::path(
    get,
    path = "/api/v1/monitor",
    responses(
        (status = 200, description = "Monitor state", body = MonitorStatusResponse)
    ),
    tag = "Monitor"
)]
pub async fn get_monitor(State(state): State<Arc<AppState>>) -> Json<MonitorStatusResponse> {
    Json(monitor_status(&state))
}

/// Start the order monitor. Starting a running monitor is a no-op.
#[utoipa::path(
    post,
    path = "/api/v1/monitor/start",
    responses(
        (status = 200, description = "Monitor running", body = MonitorStatusResponse)
    ),
    tag = "Monitor"
)]
pub async fn start_monitor(State(state): State<Arc<AppState>>) -> Json<MonitorStatusResponse> {
    if state.monitor.start() {
        info!("order monitor started via API");
    }
    Json(monitor_status(&state))
}

/// Stop the order monitor after its current tick.
#[utoipa::path(
    post,
    path = "/api/v1/monitor/stop",
    responses(
        (status = 200, description = "Monitor stopping", body = MonitorStatusResponse)
    ),
    tag = "Monitor"
)]
pub async fn stop_monitor(State(state): State<Arc<AppState>>) -> Json<MonitorStatusResponse> {
    if state.monitor.stop() {
        info!("order monitor stopped via API");
    }
    Json(monitor_status(&state))
}
