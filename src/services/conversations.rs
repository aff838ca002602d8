//! Conversation endpoints for the dashboard.
//!
//! Listing and history are plain reads. Every mutating endpoint goes
//! through the gateway dispatch functions, so real-time fan-out happens
//! whether the action arrived over REST or over a socket.

use crate::core::{AgentContext, AppError, AppState};
use crate::domain::SenderType;
use crate::dtos::{ConversationDTO, ConversationsQuery, MessageDTO, SendMessageDTO};
use crate::gateway::handlers::{
    dispatch_mark_messages_read, dispatch_mark_read, dispatch_send, dispatch_set_archived,
};
use crate::store::{ConversationFilter, ConversationStore};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

#[instrument(skip(state, agent), fields(agent_id = %agent.agent_id))]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConversationsQuery>,
    Extension(agent): Extension<AgentContext>,
) -> Result<Json<Vec<ConversationDTO>>, AppError> {
    debug!("Listing conversations");
    let filter = ConversationFilter {
        assigned_to: params.assigned_to,
        archived: params.archived.unwrap_or(false),
    };
    let conversations = state.store.list_conversations(filter).await?;

    info!(count = conversations.len(), "Conversations retrieved");
    Ok(Json(
        conversations.into_iter().map(ConversationDTO::from).collect(),
    ))
}

#[instrument(skip(state))]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i32>,
) -> Result<Json<ConversationDTO>, AppError> {
    let conversation = state.store.get_conversation(conversation_id).await?;
    Ok(Json(conversation.into()))
}

#[instrument(skip(state))]
pub async fn get_conversation_messages(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i32>,
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    let messages = state.store.list_messages(conversation_id).await?;
    debug!(count = messages.len(), "Messages retrieved");
    Ok(Json(messages.into_iter().map(MessageDTO::from).collect()))
}

/// REST fallback for sending; the socket path is preferred but both
/// end in the same dispatch and the same broadcast.
#[instrument(skip(state, agent, body), fields(agent_id = %agent.agent_id))]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i32>,
    Extension(agent): Extension<AgentContext>,
    Json(body): Json<SendMessageDTO>,
) -> Result<Json<MessageDTO>, AppError> {
    body.validate()?;
    let message =
        dispatch_send(&state, conversation_id, SenderType::Agent, &body.content).await?;
    Ok(Json(message.into()))
}

#[instrument(skip(state))]
pub async fn mark_conversation_read(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    dispatch_mark_read(&state, conversation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn mark_messages_read(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    dispatch_mark_messages_read(&state, conversation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn archive_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    dispatch_set_archived(&state, conversation_id, true).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn unarchive_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    dispatch_set_archived(&state, conversation_id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}
