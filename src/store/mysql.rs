//! MySQL store implementation.
//!
//! Queries are runtime-checked (`sqlx::query_as` with binds) against
//! the schema in `migrations/`. Snapshot maintenance for a message
//! append runs inside one transaction so the denormalized conversation
//! row can never drift from the message log.

use super::{ConversationFilter, ConversationStore, StoreError};
use crate::domain::{Conversation, DeliveryStatus, Message, SenderType, VisitorIdentity};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, QueryBuilder};
use tracing::{debug, info, instrument};

const CONVERSATION_COLUMNS: &str = "conversation_id, visitor_name, visitor_email, \
     visitor_phone, property_ref, assigned_agent_id, is_read, unread_count, archived, \
     last_message, last_message_at, created_at, updated_at";

const MESSAGE_COLUMNS: &str =
    "message_id, conversation_id, sender_type, content, delivery_status, created_at";

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn conversation_exists(&self, conversation_id: i32) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>(
            "SELECT conversation_id FROM conversations WHERE conversation_id = ?",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|_| ())
        .ok_or(StoreError::NotFound)
    }

    /// Earliest-created open conversation for this visitor + property.
    /// The explicit `created_at, conversation_id` ordering is the
    /// tie-break that makes racing submissions converge on one row.
    async fn find_open(
        &self,
        email: &str,
        property_ref: Option<&str>,
    ) -> Result<Option<Conversation>, StoreError> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations \
             WHERE archived = FALSE AND visitor_email = ? AND property_ref <=> ? \
             ORDER BY created_at ASC, conversation_id ASC LIMIT 1"
        ))
        .bind(email)
        .bind(property_ref)
        .fetch_optional(&self.pool)
        .await?;
        Ok(conversation)
    }
}

#[async_trait]
impl ConversationStore for MySqlStore {
    #[instrument(skip(self))]
    async fn list_conversations(
        &self,
        filter: ConversationFilter,
    ) -> Result<Vec<Conversation>, StoreError> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE archived = "
        ));
        query.push_bind(filter.archived);
        if let Some(agent_id) = filter.assigned_to {
            query.push(" AND assigned_agent_id = ");
            query.push_bind(agent_id);
        }
        query.push(" ORDER BY updated_at DESC");

        let conversations = query
            .build_query_as::<Conversation>()
            .fetch_all(&self.pool)
            .await?;
        debug!(count = conversations.len(), "Conversations listed");
        Ok(conversations)
    }

    #[instrument(skip(self))]
    async fn get_conversation(&self, conversation_id: i32) -> Result<Conversation, StoreError> {
        sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE conversation_id = ?"
        ))
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self))]
    async fn list_messages(&self, conversation_id: i32) -> Result<Vec<Message>, StoreError> {
        self.conversation_exists(conversation_id).await?;
        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = ? \
             ORDER BY created_at ASC, message_id ASC"
        ))
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    #[instrument(skip(self, content))]
    async fn append_message(
        &self,
        conversation_id: i32,
        sender_type: SenderType,
        content: &str,
    ) -> Result<Message, StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>(
            "SELECT conversation_id FROM conversations WHERE conversation_id = ? FOR UPDATE",
        )
        .bind(conversation_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        let inserted = sqlx::query(
            "INSERT INTO messages (conversation_id, sender_type, content, delivery_status, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(conversation_id)
        .bind(sender_type)
        .bind(content)
        .bind(DeliveryStatus::Sent)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let message_id = inserted.last_insert_id() as i32;

        if sender_type == SenderType::Visitor {
            sqlx::query(
                "UPDATE conversations SET last_message = ?, last_message_at = ?, updated_at = ?, \
                 unread_count = unread_count + 1, is_read = FALSE WHERE conversation_id = ?",
            )
        } else {
            sqlx::query(
                "UPDATE conversations SET last_message = ?, last_message_at = ?, updated_at = ? \
                 WHERE conversation_id = ?",
            )
        }
        .bind(content)
        .bind(now)
        .bind(now)
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(conversation_id, message_id, "Message appended");
        Ok(Message {
            message_id,
            conversation_id,
            sender_type,
            content: content.to_string(),
            delivery_status: DeliveryStatus::Sent,
            created_at: now,
        })
    }

    #[instrument(skip(self))]
    async fn mark_conversation_read(&self, conversation_id: i32) -> Result<(), StoreError> {
        self.conversation_exists(conversation_id).await?;
        sqlx::query(
            "UPDATE conversations SET is_read = TRUE, unread_count = 0, updated_at = ? \
             WHERE conversation_id = ?",
        )
        .bind(Utc::now())
        .bind(conversation_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_messages_read(&self, conversation_id: i32) -> Result<(), StoreError> {
        self.conversation_exists(conversation_id).await?;
        sqlx::query(
            "UPDATE messages SET delivery_status = ? WHERE conversation_id = ? AND sender_type = ?",
        )
        .bind(DeliveryStatus::Read)
        .bind(conversation_id)
        .bind(SenderType::Agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_archived(
        &self,
        conversation_id: i32,
        archived: bool,
    ) -> Result<(), StoreError> {
        self.conversation_exists(conversation_id).await?;
        sqlx::query(
            "UPDATE conversations SET archived = ?, updated_at = ? WHERE conversation_id = ?",
        )
        .bind(archived)
        .bind(Utc::now())
        .bind(conversation_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, identity), fields(email = %identity.email))]
    async fn start_or_find_conversation(
        &self,
        identity: &VisitorIdentity,
        property_ref: Option<&str>,
    ) -> Result<Conversation, StoreError> {
        if let Some(existing) = self.find_open(&identity.email, property_ref).await? {
            debug!(
                conversation_id = existing.conversation_id,
                "Resuming open conversation for visitor"
            );
            return Ok(existing);
        }

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO conversations \
             (visitor_name, visitor_email, visitor_phone, property_ref, assigned_agent_id, \
              is_read, unread_count, archived, created_at, updated_at) \
             VALUES (?, ?, ?, ?, NULL, TRUE, 0, FALSE, ?, ?)",
        )
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.phone)
        .bind(property_ref)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        // Re-select instead of trusting our own insert id: if another
        // submission raced us, both calls resolve to the earliest row.
        let conversation = self
            .find_open(&identity.email, property_ref)
            .await?
            .ok_or_else(|| StoreError::Unavailable("conversation vanished after insert".into()))?;

        info!(
            conversation_id = conversation.conversation_id,
            "Conversation created for visitor"
        );
        Ok(conversation)
    }
}
