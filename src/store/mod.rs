//! Conversation store boundary.
//!
//! The messaging core treats durable persistence as an external
//! collaborator: everything it needs is captured by [`ConversationStore`]
//! and nothing outside this module knows which backing engine is in use.
//! Two implementations ship here: [`MemoryStore`] for tests and
//! database-less dev runs, and [`MySqlStore`] over the production pool.

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

use crate::domain::{Conversation, Message, SenderType, VisitorIdentity};
use async_trait::async_trait;
use std::fmt;

/// Failures the store boundary can surface to the gateway.
///
/// `NotFound` means the referenced conversation does not exist and the
/// caller gets an explicit error response; `Unavailable` is a transient
/// I/O failure surfaced to the initiating caller only — the gateway
/// never retries on its own, that would risk duplicate sends.
#[derive(Debug)]
pub enum StoreError {
    NotFound,
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "conversation not found"),
            StoreError::Unavailable(details) => write!(f, "store unavailable: {}", details),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Filter for conversation listing. The default view excludes archived
/// conversations; they stay addressable by id through
/// [`ConversationStore::get_conversation`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversationFilter {
    pub assigned_to: Option<i32>,
    pub archived: bool,
}

/// The contract the messaging core requires from the durable store.
///
/// Each operation is independent and may suspend on external I/O; the
/// gateway never holds registry locks across these calls.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Conversations matching `filter`, most recently updated first.
    async fn list_conversations(
        &self,
        filter: ConversationFilter,
    ) -> Result<Vec<Conversation>, StoreError>;

    /// Single conversation by id, archived or not.
    async fn get_conversation(&self, conversation_id: i32) -> Result<Conversation, StoreError>;

    /// All messages of a conversation in store-assigned creation order.
    async fn list_messages(&self, conversation_id: i32) -> Result<Vec<Message>, StoreError>;

    /// Appends a message, assigning id and timestamp, and refreshes the
    /// parent conversation's last-message/unread/updated snapshot.
    /// Visitor messages bump the unread counter and clear the read
    /// flag; agent messages leave both untouched.
    async fn append_message(
        &self,
        conversation_id: i32,
        sender_type: SenderType,
        content: &str,
    ) -> Result<Message, StoreError>;

    /// Resets the unread counter and sets the read flag. Idempotent.
    async fn mark_conversation_read(&self, conversation_id: i32) -> Result<(), StoreError>;

    /// Moves every agent-authored message to `read`. Idempotent.
    async fn mark_messages_read(&self, conversation_id: i32) -> Result<(), StoreError>;

    /// Sets or clears the archived flag. Idempotent.
    async fn set_archived(&self, conversation_id: i32, archived: bool)
    -> Result<(), StoreError>;

    /// Returns the open conversation for this visitor + property, or
    /// creates one. Safe under concurrent identical calls: the
    /// earliest-created non-archived match wins and every racer
    /// resolves to that same row.
    async fn start_or_find_conversation(
        &self,
        identity: &VisitorIdentity,
        property_ref: Option<&str>,
    ) -> Result<Conversation, StoreError>;
}
