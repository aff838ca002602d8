//! WebSocket connection management.
//!
//! Each accepted socket is split into a write task fed by an unbounded
//! channel (the handle the room registry stores) and a read loop that
//! dispatches inbound events. The read loop owns cleanup: when it
//! ends, for any reason, every room this socket occupied is left and
//! presence is recomputed.

use crate::core::AppState;
use crate::dtos::{ClientEvent, ServerEvent};
use crate::gateway::handlers::{process_event, sync_presence};
use crate::gateway::{SocketContext, TIMEOUT_DURATION_SECONDS};
use crate::rooms::RoomKey;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Duration, timeout};
use tracing::{info, instrument, warn};

#[instrument(skip(ws, state), fields(socket_id = %ctx.socket_id))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, ctx: SocketContext) {
    info!("WebSocket connection established");

    let (ws_tx, ws_rx) = ws.split();

    // Everything fanned out to this socket flows through this channel;
    // the registry stores the sender, the write task drains it.
    let (tx, rx) = unbounded_channel::<ServerEvent>();

    if let Some(conversation_id) = ctx.conversation_id {
        state
            .rooms
            .join(RoomKey::Conversation(conversation_id), ctx.socket_id, tx.clone());
    }
    if let Some(user_id) = ctx.user_room {
        state.rooms.join(RoomKey::User(user_id), ctx.socket_id, tx.clone());
        sync_presence(&state, user_id);
    }

    tokio::spawn(write_ws(ctx, ws_tx, rx));
    tokio::spawn(listen_ws(ctx, ws_rx, tx, state));
}

/// Drains the socket's channel into the transport. Ends when the
/// channel closes (read loop cleaned up) or the transport rejects a
/// frame.
#[instrument(skip(websocket_tx, internal_rx), fields(socket_id = %ctx.socket_id))]
async fn write_ws(
    ctx: SocketContext,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut internal_rx: UnboundedReceiver<ServerEvent>,
) {
    info!("Write task started");

    while let Some(event) = internal_rx.recv().await {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize outbound event: {:?}", e);
                continue;
            }
        };
        if websocket_tx
            .send(Message::Text(Utf8Bytes::from(json)))
            .await
            .is_err()
        {
            warn!("Failed to send event, closing write task");
            break;
        }
    }

    info!("Write task terminated");
}

/// Reads inbound frames until close, error or idle timeout, then
/// releases every room membership this socket held.
#[instrument(skip(websocket_rx, internal_tx, state), fields(socket_id = %ctx.socket_id))]
async fn listen_ws(
    ctx: SocketContext,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<ServerEvent>,
    state: Arc<AppState>,
) {
    info!("Listen task started");

    let timeout_duration = Duration::from_secs(TIMEOUT_DURATION_SECONDS);

    loop {
        match timeout(timeout_duration, StreamExt::next(&mut websocket_rx)).await {
            Ok(Some(msg_result)) => {
                let msg = match msg_result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("WebSocket error: {:?}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => process_event(&state, &ctx, &internal_tx, event).await,
                        Err(_) => {
                            // Malformed payloads are rejected per
                            // message; the connection stays open.
                            warn!("Failed to deserialize inbound event");
                            let _ = internal_tx.send(ServerEvent::Error {
                                code: 400,
                                message: "Malformed event payload".to_string(),
                            });
                        }
                    },
                    Message::Close(_) => {
                        info!("Close message received");
                        break;
                    }
                    _ => {}
                }
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout_secs = TIMEOUT_DURATION_SECONDS, "Connection timeout");
                break;
            }
        }
    }

    info!("Cleaning up connection");
    if let Some(conversation_id) = ctx.conversation_id {
        state
            .rooms
            .leave(RoomKey::Conversation(conversation_id), &ctx.socket_id);
    }
    if let Some(user_id) = ctx.user_room {
        state.rooms.leave(RoomKey::User(user_id), &ctx.socket_id);
        sync_presence(&state, user_id);
    }
    info!("Listen task terminated");
}
