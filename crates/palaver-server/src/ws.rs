//! WebSocket transport for the real-time protocol.
//!
//! Each socket gets a connection id from the [`SessionCoordinator`]. A
//! forwarding task drains the connection's event channel into the socket,
//! while the receive loop spawns one task per inbound text frame.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::session::SessionCoordinator;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> impl IntoResponse {
    let coordinator = state.coordinator.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, coordinator, addr))
}

async fn handle_socket(socket: WebSocket, coordinator: Arc<SessionCoordinator>, addr: SocketAddr) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (connection, mut rx) = coordinator.connect().await;

    info!(connection = %connection, addr = %addr, "WebSocket connected");

    let forward_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match event.to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!(event = event.name(), error = %e, "Failed to encode event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = ws_receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let coordinator = coordinator.clone();
                tokio::spawn(async move {
                    coordinator.handle_frame(connection, &text).await;
                });
            }
            Ok(Message::Binary(_)) => {
                debug!(connection = %connection, "Ignoring binary frame");
            }
            Ok(Message::Close(_)) => break,
            // axum answers pings itself.
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Err(e) => {
                debug!(connection = %connection, error = %e, "WebSocket error");
                break;
            }
        }
    }

    coordinator.disconnect(connection).await;
    forward_task.abort();
    info!(connection = %connection, addr = %addr, "WebSocket disconnected");
}
