//! HTTP service handlers.
//!
//! One module per surface: conversation endpoints for the dashboard,
//! the widget bootstrap endpoint for anonymous visitors.

pub mod conversations;
pub mod widget;

pub use conversations::{
    archive_conversation, get_conversation, get_conversation_messages, list_conversations,
    mark_conversation_read, mark_messages_read, send_message, unarchive_conversation,
};
pub use widget::start_widget_session;

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
