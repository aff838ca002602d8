//! Gateway event dispatch.
//!
//! `process_event` routes inbound socket events; the `dispatch_*`
//! functions below it carry the store write + fan-out sequence and are
//! shared with the REST fallback handlers, so broadcasts happen the
//! same way on either transport.
//!
//! Fan-out ordering rule: the broadcast snapshot of room membership is
//! taken only after the store write completes, and no registry lock is
//! ever held across a store call.

use crate::core::{AppError, AppState};
use crate::domain::{Message, SenderType};
use crate::dtos::{ClientEvent, MessageDTO, ServerEvent};
use crate::gateway::SocketContext;
use crate::rooms::RoomKey;
use crate::store::ConversationStore;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const MAX_CONTENT_LENGTH: usize = 5000;

/// Routes one inbound event. Failures never propagate past the
/// initiating socket: they come back as an `error` event on `reply`
/// and nothing is broadcast.
pub async fn process_event(
    state: &AppState,
    ctx: &SocketContext,
    reply: &UnboundedSender<ServerEvent>,
    event: ClientEvent,
) {
    let result = match event {
        ClientEvent::SendMessage { content } => match ctx.conversation_id {
            Some(conversation_id) => {
                dispatch_send(state, conversation_id, ctx.origin.sender_type(), &content)
                    .await
                    .map(|_| ())
            }
            None => Err(AppError::bad_request(
                "This socket is not joined to a conversation",
            )),
        },

        ClientEvent::Typing => match ctx.conversation_id {
            Some(conversation_id) => {
                dispatch_typing(
                    state,
                    conversation_id,
                    ctx.origin.sender_type(),
                    &ctx.socket_id,
                );
                Ok(())
            }
            None => Err(AppError::bad_request(
                "This socket is not joined to a conversation",
            )),
        },

        ClientEvent::MarkRead => match agent_conversation(ctx) {
            Ok(conversation_id) => dispatch_mark_read(state, conversation_id).await,
            Err(e) => Err(e),
        },

        ClientEvent::MarkMessagesRead => match agent_conversation(ctx) {
            Ok(conversation_id) => dispatch_mark_messages_read(state, conversation_id).await,
            Err(e) => Err(e),
        },

        ClientEvent::Archive => match agent_conversation(ctx) {
            Ok(conversation_id) => dispatch_set_archived(state, conversation_id, true).await,
            Err(e) => Err(e),
        },

        ClientEvent::Unarchive => match agent_conversation(ctx) {
            Ok(conversation_id) => dispatch_set_archived(state, conversation_id, false).await,
            Err(e) => Err(e),
        },
    };

    if let Err(err) = result {
        warn!(error = err.message(), "Inbound event rejected");
        let _ = reply.send(ServerEvent::Error {
            code: err.status().as_u16(),
            message: err.message().to_string(),
        });
    }
}

/// Read-state and archive actions are agent-only; a widget socket
/// attempting them gets a per-event rejection, not a closed connection.
fn agent_conversation(ctx: &SocketContext) -> Result<i32, AppError> {
    if !ctx.origin.is_agent() {
        return Err(AppError::forbidden("Agents only"));
    }
    ctx.conversation_id
        .ok_or_else(|| AppError::bad_request("This socket is not joined to a conversation"))
}

/// Appends a message and fans it out: `new_message` to the
/// conversation room, a refreshed snapshot to the dashboard user
/// rooms. On store failure nothing is broadcast and the error belongs
/// to the caller alone.
#[instrument(skip(state, content))]
pub async fn dispatch_send(
    state: &AppState,
    conversation_id: i32,
    sender_type: SenderType,
    content: &str,
) -> Result<Message, AppError> {
    if content.trim().is_empty() || content.len() > MAX_CONTENT_LENGTH {
        return Err(AppError::bad_request(
            "Message content must be between 1 and 5000 characters",
        ));
    }

    let message = state
        .store
        .append_message(conversation_id, sender_type, content)
        .await?;

    let reached = state.rooms.broadcast(
        RoomKey::Conversation(conversation_id),
        &ServerEvent::NewMessage {
            message: MessageDTO::from(message.clone()),
        },
    );
    debug!(reached, "new_message fanned out");

    publish_conversation(state, conversation_id).await;
    Ok(message)
}

/// Ephemeral typing signal: no store write, not echoed to the sender.
pub fn dispatch_typing(
    state: &AppState,
    conversation_id: i32,
    sender_type: SenderType,
    sender_socket: &Uuid,
) {
    state.rooms.broadcast_except(
        RoomKey::Conversation(conversation_id),
        sender_socket,
        &ServerEvent::UserTyping { sender_type },
    );
}

#[instrument(skip(state))]
pub async fn dispatch_mark_read(state: &AppState, conversation_id: i32) -> Result<(), AppError> {
    state.store.mark_conversation_read(conversation_id).await?;
    publish_conversation(state, conversation_id).await;
    Ok(())
}

/// Marks every agent-authored message read and tells the conversation
/// room, so the other party renders read receipts.
#[instrument(skip(state))]
pub async fn dispatch_mark_messages_read(
    state: &AppState,
    conversation_id: i32,
) -> Result<(), AppError> {
    state.store.mark_messages_read(conversation_id).await?;
    state.rooms.broadcast(
        RoomKey::Conversation(conversation_id),
        &ServerEvent::MessagesRead,
    );
    Ok(())
}

#[instrument(skip(state))]
pub async fn dispatch_set_archived(
    state: &AppState,
    conversation_id: i32,
    archived: bool,
) -> Result<(), AppError> {
    state.store.set_archived(conversation_id, archived).await?;
    publish_conversation(state, conversation_id).await;
    Ok(())
}

/// Recomputes a user's online state from their user-room member count
/// and, on a flip, notifies every dashboard presence socket.
pub fn sync_presence(state: &AppState, user_id: i32) {
    let member_count = state.rooms.member_count(RoomKey::User(user_id));
    if let Some(online) = state.presence.observe(user_id, member_count) {
        info!(user_id, online, "Presence changed");
        state
            .rooms
            .broadcast_to_users(&ServerEvent::UserStatus { user_id, online });
    }
}

/// Pushes the refreshed conversation snapshot to dashboard list views.
/// Best-effort: a failed refresh only costs the push, never the action
/// that triggered it.
async fn publish_conversation(state: &AppState, conversation_id: i32) {
    match state.store.get_conversation(conversation_id).await {
        Ok(conversation) => {
            state.rooms.broadcast_to_users(&ServerEvent::ConversationUpdated {
                conversation: conversation.into(),
            });
        }
        Err(err) => warn!(conversation_id, %err, "Could not refresh conversation snapshot"),
    }
}
