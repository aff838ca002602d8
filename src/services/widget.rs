//! Widget session bootstrap.
//!
//! Turns an anonymous visitor's contact form into a conversation id the
//! widget socket can subscribe to. History rides along in the response
//! so a resuming visitor renders the transcript before the socket
//! connects; there is no window where the socket is live but the
//! transcript is blank.

use crate::core::auth::require_widget_key;
use crate::core::{AppError, AppState};
use crate::domain::VisitorIdentity;
use crate::dtos::{MessageDTO, SessionDTO, StartSessionDTO};
use crate::store::ConversationStore;
use axum::{
    extract::{Json, State},
    http::HeaderMap,
};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[instrument(skip(state, headers, body), fields(email = %body.email))]
pub async fn start_widget_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<StartSessionDTO>,
) -> Result<Json<SessionDTO>, AppError> {
    require_widget_key(
        headers.get("x-api-key").and_then(|v| v.to_str().ok()),
        &state.widget_api_key,
    )?;
    body.validate()?;

    let property_ref = body.property_ref.clone();
    let identity = VisitorIdentity::from(body);

    let conversation = state
        .store
        .start_or_find_conversation(&identity, property_ref.as_deref())
        .await?;
    let history: Vec<MessageDTO> = state
        .store
        .list_messages(conversation.conversation_id)
        .await?
        .into_iter()
        .map(MessageDTO::from)
        .collect();

    info!(
        conversation_id = conversation.conversation_id,
        resumed = !history.is_empty(),
        "Widget session bootstrapped"
    );
    Ok(Json(SessionDTO {
        conversation_id: conversation.conversation_id,
        history,
    }))
}
