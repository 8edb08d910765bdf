//! Route configuration.

use crate::api::{handlers, websocket};
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

/// Creates the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // WebSocket
        .route("/ws", get(websocket::ws_handler))
        // Quotes
        .route("/api/v1/quotes/{symbol}", get(handlers::get_quote))
        .route("/api/v1/chains/{symbol}", get(handlers::get_chain))
        .route("/api/v1/provider", get(handlers::get_provider_status))
        // Orders
        .route(
            "/api/v1/orders",
            post(handlers::place_order)
                .get(handlers::list_orders)
                .delete(handlers::clear_orders),
        )
        .route(
            "/api/v1/orders/{order_id}",
            get(handlers::get_order).delete(handlers::delete_order),
        )
        // Monitor
        .route("/api/v1/monitor", get(handlers::get_monitor))
        .route("/api/v1/monitor/start", post(handlers::start_monitor))
        .route("/api/v1/monitor/stop", post(handlers::stop_monitor))
        .with_state(state)
}
