//! Messaging gateway: the protocol state machine on top of the room
//! registry and the store adapter.
//!
//! Three socket kinds connect here:
//! - dashboard conversation sockets (agent session, one conversation room)
//! - dashboard presence sockets (agent session, that agent's user room)
//! - anonymous widget sockets (shared API key + previously-issued
//!   conversation id, visitor-origin membership of the conversation room)

pub mod connection;
pub mod handlers;

pub use connection::handle_socket;

use crate::core::auth::require_widget_key;
use crate::core::{AgentContext, AppError, AppState};
use crate::domain::SenderType;
use crate::store::ConversationStore;
use axum::{
    Extension,
    extract::{Path, Query, State, ws::WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Idle window after which a silent connection is presumed dead and
/// reclaimed. Clients ride reconnect logic, not this timeout.
pub const TIMEOUT_DURATION_SECONDS: u64 = 300;

/// Who sits at the far end of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketOrigin {
    Agent { agent_id: i32 },
    Visitor,
}

impl SocketOrigin {
    pub fn sender_type(&self) -> SenderType {
        match self {
            SocketOrigin::Agent { .. } => SenderType::Agent,
            SocketOrigin::Visitor => SenderType::Visitor,
        }
    }

    pub fn is_agent(&self) -> bool {
        matches!(self, SocketOrigin::Agent { .. })
    }
}

/// Per-connection context: identity plus the rooms this socket
/// occupies. A socket holds at most one conversation room and at most
/// one user room.
#[derive(Debug, Clone, Copy)]
pub struct SocketContext {
    pub socket_id: Uuid,
    pub origin: SocketOrigin,
    pub conversation_id: Option<i32>,
    pub user_room: Option<i32>,
}

impl SocketContext {
    pub fn conversation(origin: SocketOrigin, conversation_id: i32) -> Self {
        Self {
            socket_id: Uuid::new_v4(),
            origin,
            conversation_id: Some(conversation_id),
            user_room: None,
        }
    }

    pub fn presence(agent_id: i32) -> Self {
        Self {
            socket_id: Uuid::new_v4(),
            origin: SocketOrigin::Agent { agent_id },
            conversation_id: None,
            user_room: Some(agent_id),
        }
    }
}

/// Upgrade endpoint for a dashboard conversation socket. The
/// conversation must exist before the upgrade goes through.
pub async fn conversation_ws_handler(
    ws: WebSocketUpgrade,
    Path(conversation_id): Path<i32>,
    State(state): State<Arc<AppState>>,
    Extension(agent): Extension<AgentContext>,
) -> Result<Response, AppError> {
    state.store.get_conversation(conversation_id).await?;

    let ctx = SocketContext::conversation(
        SocketOrigin::Agent {
            agent_id: agent.agent_id,
        },
        conversation_id,
    );
    info!(agent_id = agent.agent_id, conversation_id, "Conversation socket accepted");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, ctx)))
}

/// Upgrade endpoint for a dashboard presence socket: joins the agent's
/// own user room and from then on receives `user_status` and
/// `conversation_updated` events.
pub async fn presence_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(agent): Extension<AgentContext>,
) -> Response {
    let ctx = SocketContext::presence(agent.agent_id);
    info!(agent_id = agent.agent_id, "Presence socket accepted");
    ws.on_upgrade(move |socket| handle_socket(socket, state, ctx))
}

#[derive(Deserialize)]
pub struct WidgetWsQuery {
    pub api_key: Option<String>,
}

/// Upgrade endpoint for an anonymous widget socket. Browsers cannot
/// set headers on a websocket handshake, so the shared key arrives as
/// a query parameter. Membership is visitor-origin: same room, but the
/// gateway never routes agent-only events through it.
pub async fn widget_ws_handler(
    ws: WebSocketUpgrade,
    Path(conversation_id): Path<i32>,
    Query(query): Query<WidgetWsQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    require_widget_key(query.api_key.as_deref(), &state.widget_api_key)?;
    state.store.get_conversation(conversation_id).await?;

    let ctx = SocketContext::conversation(SocketOrigin::Visitor, conversation_id);
    info!(conversation_id, "Widget socket accepted");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, ctx)))
}
