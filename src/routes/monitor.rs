//! # routes::monitor
//!
//! **Monitor Loop** — WebSocket event stream สำหรับ Dashboard
//!
//! | Method    | Path          | Description                              |
//! |-----------|---------------|------------------------------------------|
//! | GET (WS)  | `/ws/monitor` | SNAPSHOT ทันทีที่ต่อ แล้วตามด้วยทุก WsEvent |

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use crate::{events::WsEvent, state::SharedState};

// ─── WebSocket Handler ────────────────────────────────────────────────────────

/// Upgrade HTTP → WebSocket แล้ว subscribe broadcast channel
///
/// Dashboard ต่อที่ `ws://localhost:3000/ws/monitor`
/// ทุก WsEvent จะถูกส่งมาเป็น JSON text frame
pub async fn ws_monitor(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Full picture for a freshly connected client.
async fn snapshot(state: &SharedState) -> WsEvent {
    WsEvent::Snapshot {
        feed:        state.feed.status().await,
        instruments: state.feed.snapshot().await.instruments,
        portfolio:   Box::new(state.portfolio().await),
        alerts:      state.feed.recent_alerts().await,
    }
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    // subscribe ก่อนทำ snapshot เพื่อไม่ให้ event ระหว่างนั้นหาย
    let mut rx = state.broadcast_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    info!("🔌 WebSocket client connected");

    let first = snapshot(&state).await.to_json();
    if sender.send(Message::Text(first)).await.is_err() {
        return; // Client ปิดก่อน snapshot ส่งได้
    }

    // ── Event Loop ────────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(json_str) => {
                        if sender.send(Message::Text(json_str)).await.is_err() {
                            break; // Client disconnect
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        // Client read ช้าเกินไป — บาง Event ถูก skip
                        debug!("WS client lagged, skipped {n} events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            result = receiver.next() => {
                match result {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    _ => {} // Text/Binary from client — ignored
                }
            }
        }
    }

    info!("🔌 WebSocket client disconnected");
}
