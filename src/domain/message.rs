//! Message entity.

use super::enums::{DeliveryStatus, SenderType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only chat message. Order within a conversation is the order
/// the store assigned at creation, never anything client-supplied.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Message {
    pub message_id: i32,
    pub conversation_id: i32,
    pub sender_type: SenderType,
    pub content: String,
    pub delivery_status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
}
