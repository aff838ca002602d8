//! In-memory store implementation.
//!
//! Backs the integration tests and database-less development runs. All
//! state sits behind one mutex, which also makes
//! `start_or_find_conversation` trivially atomic: lookup and insert
//! happen under the same lock, so identical concurrent calls converge
//! on the earliest-created row.

use super::{ConversationFilter, ConversationStore, StoreError};
use crate::domain::{Conversation, DeliveryStatus, Message, SenderType, VisitorIdentity};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Default)]
struct Inner {
    next_conversation_id: i32,
    next_message_id: i32,
    conversations: BTreeMap<i32, Conversation>,
    messages: BTreeMap<i32, Vec<Message>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a panicking test; the data itself
        // is still consistent because every mutation is single-step.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn list_conversations(
        &self,
        filter: ConversationFilter,
    ) -> Result<Vec<Conversation>, StoreError> {
        let inner = self.lock();
        let mut out: Vec<Conversation> = inner
            .conversations
            .values()
            .filter(|c| c.archived == filter.archived)
            .filter(|c| match filter.assigned_to {
                Some(agent_id) => c.assigned_agent_id == Some(agent_id),
                None => true,
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }

    async fn get_conversation(&self, conversation_id: i32) -> Result<Conversation, StoreError> {
        self.lock()
            .conversations
            .get(&conversation_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_messages(&self, conversation_id: i32) -> Result<Vec<Message>, StoreError> {
        let inner = self.lock();
        if !inner.conversations.contains_key(&conversation_id) {
            return Err(StoreError::NotFound);
        }
        Ok(inner
            .messages
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_message(
        &self,
        conversation_id: i32,
        sender_type: SenderType,
        content: &str,
    ) -> Result<Message, StoreError> {
        let mut inner = self.lock();
        let now = Utc::now();

        let conversation = inner
            .conversations
            .get_mut(&conversation_id)
            .ok_or(StoreError::NotFound)?;

        conversation.last_message = Some(content.to_string());
        conversation.last_message_at = Some(now);
        conversation.updated_at = now;
        if sender_type == SenderType::Visitor {
            conversation.unread_count += 1;
            conversation.is_read = false;
        }

        inner.next_message_id += 1;
        let message = Message {
            message_id: inner.next_message_id,
            conversation_id,
            sender_type,
            content: content.to_string(),
            delivery_status: DeliveryStatus::Sent,
            created_at: now,
        };
        inner
            .messages
            .entry(conversation_id)
            .or_default()
            .push(message.clone());

        debug!(conversation_id, message_id = message.message_id, "Message appended");
        Ok(message)
    }

    async fn mark_conversation_read(&self, conversation_id: i32) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let conversation = inner
            .conversations
            .get_mut(&conversation_id)
            .ok_or(StoreError::NotFound)?;
        conversation.is_read = true;
        conversation.unread_count = 0;
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_messages_read(&self, conversation_id: i32) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.conversations.contains_key(&conversation_id) {
            return Err(StoreError::NotFound);
        }
        if let Some(messages) = inner.messages.get_mut(&conversation_id) {
            for message in messages
                .iter_mut()
                .filter(|m| m.sender_type == SenderType::Agent)
            {
                message.delivery_status = DeliveryStatus::Read;
            }
        }
        Ok(())
    }

    async fn set_archived(
        &self,
        conversation_id: i32,
        archived: bool,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let conversation = inner
            .conversations
            .get_mut(&conversation_id)
            .ok_or(StoreError::NotFound)?;
        conversation.archived = archived;
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn start_or_find_conversation(
        &self,
        identity: &VisitorIdentity,
        property_ref: Option<&str>,
    ) -> Result<Conversation, StoreError> {
        let mut inner = self.lock();

        // Ids are monotonic, so the lowest id is the earliest-created
        // open match; this is the tie-break rule for racing submissions.
        let existing = inner
            .conversations
            .values()
            .filter(|c| {
                !c.archived
                    && c.visitor_email == identity.email
                    && c.property_ref.as_deref() == property_ref
            })
            .min_by_key(|c| c.conversation_id)
            .cloned();
        if let Some(conversation) = existing {
            debug!(
                conversation_id = conversation.conversation_id,
                "Resuming open conversation for visitor"
            );
            return Ok(conversation);
        }

        let now = Utc::now();
        inner.next_conversation_id += 1;
        let conversation = Conversation {
            conversation_id: inner.next_conversation_id,
            visitor_name: identity.name.clone(),
            visitor_email: identity.email.clone(),
            visitor_phone: identity.phone.clone(),
            property_ref: property_ref.map(str::to_string),
            assigned_agent_id: None,
            is_read: true,
            unread_count: 0,
            archived: false,
            last_message: None,
            last_message_at: None,
            created_at: now,
            updated_at: now,
        };
        inner
            .conversations
            .insert(conversation.conversation_id, conversation.clone());

        info!(
            conversation_id = conversation.conversation_id,
            "Conversation created for visitor"
        );
        Ok(conversation)
    }
}
