//! WebSocket handler streaming ledger changes.

use crate::ledger::LedgerEvent;
use crate::models::SavedOrder;
use crate::state::AppState;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info};

/// WebSocket message types sent to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// An order was saved.
    #[serde(rename = "order_saved")]
    OrderSaved(SavedOrder),
    /// An order changed status or details.
    #[serde(rename = "order_updated")]
    OrderUpdated(SavedOrder),
    /// An order was removed.
    #[serde(rename = "order_removed")]
    OrderRemoved {
        /// Order identifier.
        order_id: String,
    },
    /// The ledger was emptied.
    #[serde(rename = "ledger_cleared")]
    LedgerCleared {
        /// Number of orders removed.
        removed: usize,
    },
    /// Connection established.
    #[serde(rename = "connected")]
    Connected {
        /// Welcome message.
        message: String,
        /// Orders in the ledger at connection time.
        orders: Vec<SavedOrder>,
    },
    /// Heartbeat/ping.
    #[serde(rename = "heartbeat")]
    Heartbeat {
        /// Timestamp in milliseconds.
        timestamp: i64,
    },
}

impl From<LedgerEvent> for WsMessage {
    fn from(event: LedgerEvent) -> Self {
        match event {
            LedgerEvent::Appended(order) => WsMessage::OrderSaved(order),
            LedgerEvent::Updated(order) => WsMessage::OrderUpdated(order),
            LedgerEvent::Removed(order_id) => WsMessage::OrderRemoved { order_id },
            LedgerEvent::Cleared(removed) => WsMessage::LedgerCleared { removed },
        }
    }
}

/// WebSocket upgrade handler.
#[utoipa::path(
    get,
    path = "/ws",
    responses(
        (status = 101, description = "WebSocket connection established")
    ),
    tag = "WebSocket"
)]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before the snapshot so no change falls between the two.
    let mut event_rx = state.ledger.subscribe();

    let orders = match state.ledger.load() {
        Ok(orders) => orders,
        Err(e) => {
            error!("Cannot load ledger for WebSocket client: {}", e);
            Vec::new()
        }
    };
    let connected_msg = WsMessage::Connected {
        message: "Connected to Options Paper Desk".to_string(),
        orders,
    };
    if let Ok(json) = serde_json::to_string(&connected_msg) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    info!("WebSocket client connected");

    let recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    debug!("Ignoring WebSocket message: {}", text);
                }
                Ok(Message::Close(_)) => {
                    info!("WebSocket client disconnected");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Ok(event) => {
                            let msg = WsMessage::from(event);
                            if let Ok(json) = serde_json::to_string(&msg)
                                && sender.send(Message::Text(json.into())).await.is_err()
                            {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(n)) => {
                            debug!("WebSocket lagged {} messages", n);
                        }
                        Err(RecvError::Closed) => {
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep(tokio::time::Duration::from_secs(30)) => {
                    let heartbeat = WsMessage::Heartbeat {
                        timestamp: chrono::Utc::now().timestamp_millis(),
                    };
                    if let Ok(json) = serde_json::to_string(&heartbeat)
                        && sender.send(Message::Text(json.into())).await.is_err()
                    {
                        break;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = recv_task => {}
        _ = send_task => {}
    }

    info!("WebSocket connection closed");
}
