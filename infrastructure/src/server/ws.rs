//! WebSocket endpoint for the extension
//!
//! One task owns the write half (fed by the registry's command channel)
//! and the handler task owns the read half, so reads never contend with
//! writes. On close — ours or theirs — the bridge decides whether this
//! was the authoritative connection and sweeps pending requests exactly
//! once.

use crate::bridge::CouncilBridge;
use crate::bridge::registry::SocketCommand;
use crate::server::AppState;
use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// GET /ws - WebSocket upgrade for the extension
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_extension_socket(socket, Arc::clone(&state.bridge)))
}

async fn handle_extension_socket(socket: WebSocket, bridge: Arc<CouncilBridge>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<SocketCommand>();
    let connection_id = bridge.register_connection(tx);

    // Pump: registry commands -> socket write half.
    let send_task = tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                SocketCommand::Send(text) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                SocketCommand::Pong(payload) => {
                    if sink.send(Message::Pong(payload.into())).await.is_err() {
                        break;
                    }
                }
                SocketCommand::Close => {
                    let _ = sink
                        .send(Message::Close(Some(CloseFrame {
                            code: close_code::NORMAL,
                            reason: Utf8Bytes::from_static("superseded"),
                        })))
                        .await;
                    break;
                }
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => bridge.handle_frame(text.as_str()),
            Ok(Message::Ping(payload)) => bridge.pong(payload.to_vec()),
            Ok(Message::Close(_)) => {
                debug!("extension sent close frame");
                break;
            }
            Ok(_) => {}
            Err(error) => {
                warn!(%error, "websocket read error");
                break;
            }
        }
    }

    // One authoritative close triggers exactly one pending sweep.
    bridge.connection_closed(connection_id);
    send_task.abort();
}
