//! Conversation DTOs.

use crate::domain::Conversation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conversation as rendered to dashboard list views.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConversationDTO {
    pub conversation_id: i32,
    pub visitor_name: String,
    pub visitor_email: String,
    pub visitor_phone: Option<String>,
    pub property_ref: Option<String>,
    pub assigned_agent_id: Option<i32>,
    pub is_read: bool,
    pub unread_count: i32,
    pub archived: bool,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationDTO {
    fn from(value: Conversation) -> Self {
        Self {
            conversation_id: value.conversation_id,
            visitor_name: value.visitor_name,
            visitor_email: value.visitor_email,
            visitor_phone: value.visitor_phone,
            property_ref: value.property_ref,
            assigned_agent_id: value.assigned_agent_id,
            is_read: value.is_read,
            unread_count: value.unread_count,
            archived: value.archived,
            last_message: value.last_message,
            last_message_at: value.last_message_at,
            updated_at: value.updated_at,
        }
    }
}
