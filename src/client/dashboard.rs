//! Dashboard conversation-list controller.
//!
//! Keeps the agent-side list consistent from `conversation_updated` and
//! `user_status` events, and models the archive action as
//! reconciliation: apply locally, roll back if the server says no —
//! never assume success.

use crate::dtos::{ClientEvent, ConversationDTO, ServerEvent};
use std::collections::HashSet;

/// Rollback token for an optimistic archive. Holds the removed entry
/// so a failure response can restore it.
#[derive(Debug, Clone)]
pub struct PendingArchive {
    conversation: ConversationDTO,
}

#[derive(Default)]
pub struct ConversationListView {
    items: Vec<ConversationDTO>,
    online_agents: HashSet<i32>,
}

impl ConversationListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole list from a fresh REST fetch.
    pub fn reset(&mut self, conversations: Vec<ConversationDTO>) {
        self.items = conversations.into_iter().filter(|c| !c.archived).collect();
        self.sort();
    }

    pub fn items(&self) -> &[ConversationDTO] {
        &self.items
    }

    pub fn agent_online(&self, agent_id: i32) -> bool {
        self.online_agents.contains(&agent_id)
    }

    /// Feeds one event from the presence socket.
    pub fn apply_event(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::ConversationUpdated { conversation } => {
                self.upsert(conversation.clone());
            }
            ServerEvent::UserStatus { user_id, online } => {
                if *online {
                    self.online_agents.insert(*user_id);
                } else {
                    self.online_agents.remove(user_id);
                }
            }
            // Transcript-level events belong to the conversation socket.
            _ => {}
        }
    }

    /// The agent opened a conversation: zero the unread badge locally
    /// and hand back the read signals to put on the wire. The next
    /// `conversation_updated` reconciles whatever the server decided.
    pub fn open_conversation(&mut self, conversation_id: i32) -> Vec<ClientEvent> {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|c| c.conversation_id == conversation_id)
        {
            item.unread_count = 0;
            item.is_read = true;
        }
        vec![ClientEvent::MarkRead, ClientEvent::MarkMessagesRead]
    }

    /// Removes the conversation from view before the archive call
    /// resolves. Returns the rollback token, or `None` for an id not
    /// in the list.
    pub fn archive_locally(&mut self, conversation_id: i32) -> Option<PendingArchive> {
        let index = self
            .items
            .iter()
            .position(|c| c.conversation_id == conversation_id)?;
        Some(PendingArchive {
            conversation: self.items.remove(index),
        })
    }

    /// Settles an optimistic archive: drop the token on success,
    /// restore the entry on failure.
    pub fn resolve_archive(&mut self, pending: PendingArchive, success: bool) {
        if !success {
            self.upsert(pending.conversation);
        }
    }

    fn upsert(&mut self, conversation: ConversationDTO) {
        self.items
            .retain(|c| c.conversation_id != conversation.conversation_id);
        if !conversation.archived {
            self.items.push(conversation);
        }
        self.sort();
    }

    fn sort(&mut self) {
        self.items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn conversation(id: i32, minutes_ago: i64) -> ConversationDTO {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        ConversationDTO {
            conversation_id: id,
            visitor_name: "Ana".to_string(),
            visitor_email: "ana@x.com".to_string(),
            visitor_phone: None,
            property_ref: None,
            assigned_agent_id: None,
            is_read: true,
            unread_count: 0,
            archived: false,
            last_message: None,
            last_message_at: None,
            updated_at: at,
        }
    }

    #[test]
    fn list_sorts_most_recent_first() {
        let mut view = ConversationListView::new();
        view.reset(vec![conversation(1, 60), conversation(2, 5), conversation(3, 30)]);

        let ids: Vec<i32> = view.items().iter().map(|c| c.conversation_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn conversation_updated_upserts_and_resorts() {
        let mut view = ConversationListView::new();
        view.reset(vec![conversation(1, 60), conversation(2, 5)]);

        let mut refreshed = conversation(1, 0);
        refreshed.unread_count = 1;
        view.apply_event(&ServerEvent::ConversationUpdated {
            conversation: refreshed,
        });

        assert_eq!(view.items()[0].conversation_id, 1);
        assert_eq!(view.items()[0].unread_count, 1);
        assert_eq!(view.items().len(), 2);
    }

    #[test]
    fn archived_update_drops_the_entry() {
        let mut view = ConversationListView::new();
        view.reset(vec![conversation(1, 10)]);

        let mut archived = conversation(1, 0);
        archived.archived = true;
        view.apply_event(&ServerEvent::ConversationUpdated {
            conversation: archived,
        });

        assert!(view.items().is_empty());
    }

    #[test]
    fn optimistic_archive_rolls_back_on_failure() {
        let mut view = ConversationListView::new();
        view.reset(vec![conversation(1, 10), conversation(2, 5)]);

        let pending = view.archive_locally(1).unwrap();
        assert_eq!(view.items().len(), 1);

        view.resolve_archive(pending, false);
        assert_eq!(view.items().len(), 2);
        assert!(view.items().iter().any(|c| c.conversation_id == 1));
    }

    #[test]
    fn optimistic_archive_stays_gone_on_success() {
        let mut view = ConversationListView::new();
        view.reset(vec![conversation(1, 10)]);

        let pending = view.archive_locally(1).unwrap();
        view.resolve_archive(pending, true);
        assert!(view.items().is_empty());
    }

    #[test]
    fn open_conversation_clears_unread_and_emits_read_signals() {
        let mut view = ConversationListView::new();
        let mut item = conversation(1, 10);
        item.unread_count = 3;
        item.is_read = false;
        view.reset(vec![item]);

        let signals = view.open_conversation(1);

        assert_eq!(view.items()[0].unread_count, 0);
        assert!(view.items()[0].is_read);
        assert!(matches!(signals[0], ClientEvent::MarkRead));
        assert!(matches!(signals[1], ClientEvent::MarkMessagesRead));
    }

    #[test]
    fn presence_events_track_online_agents() {
        let mut view = ConversationListView::new();
        view.apply_event(&ServerEvent::UserStatus {
            user_id: 7,
            online: true,
        });
        assert!(view.agent_online(7));

        view.apply_event(&ServerEvent::UserStatus {
            user_id: 7,
            online: false,
        });
        assert!(!view.agent_online(7));
    }
}
