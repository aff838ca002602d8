//! Message DTOs.

use crate::domain::{DeliveryStatus, Message, SenderType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Message as sent to transcripts (both dashboard and widget).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageDTO {
    pub message_id: i32,
    pub conversation_id: i32,
    pub sender_type: SenderType,
    pub content: String,
    pub delivery_status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDTO {
    fn from(value: Message) -> Self {
        Self {
            message_id: value.message_id,
            conversation_id: value.conversation_id,
            sender_type: value.sender_type,
            content: value.content,
            delivery_status: value.delivery_status,
            created_at: value.created_at,
        }
    }
}

/// Body of the REST send-message fallback.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct SendMessageDTO {
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Message content must be between 1 and 5000 characters"
    ))]
    pub content: String,
}
