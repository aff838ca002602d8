//! Conversation entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persistent thread between one (optionally unassigned) agent and one
/// visitor, optionally tied to a property listing.
///
/// `last_message` / `last_message_at` are denormalized from the newest
/// message so list views render without a join. `unread_count` counts
/// visitor messages the agent has not acknowledged; it only ever resets
/// through an explicit mark-read. Archived conversations stay fully
/// addressable by id.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Conversation {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
