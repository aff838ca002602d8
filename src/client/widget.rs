//! Widget transcript controller.
//!
//! The visitor-side view: bootstrap history from the session response,
//! fold socket events into the transcript with duplicate suppression
//! (delivery is at-least-once), keep the typing indicator, and track
//! outbound sends so a failed one surfaces as retryable instead of
//! silently vanishing.

use crate::client::typing::TypingState;
use crate::domain::{DeliveryStatus, SenderType};
use crate::dtos::{ClientEvent, MessageDTO, ServerEvent};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    InFlight,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PendingSend {
    pub content: String,
    pub state: SendState,
}

#[derive(Default)]
pub struct WidgetTranscript {
    messages: Vec<MessageDTO>,
    seen: HashSet<i32>,
    typing: TypingState,
    pending: Vec<PendingSend>,
}

impl WidgetTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the history returned by the bootstrap endpoint.
    pub fn bootstrap(&mut self, history: Vec<MessageDTO>) {
        self.seen = history.iter().map(|m| m.message_id).collect();
        self.messages = history;
    }

    pub fn messages(&self) -> &[MessageDTO] {
        &self.messages
    }

    pub fn agent_typing(&self) -> bool {
        self.typing.is_active()
    }

    pub fn pending(&self) -> &[PendingSend] {
        &self.pending
    }

    /// Registers an outbound message and returns the wire event.
    pub fn begin_send(&mut self, content: &str) -> ClientEvent {
        self.pending.push(PendingSend {
            content: content.to_string(),
            state: SendState::InFlight,
        });
        ClientEvent::SendMessage {
            content: content.to_string(),
        }
    }

    /// Re-arms a failed send and returns the event to put back on the
    /// wire, or `None` when nothing failed.
    pub fn retry_failed(&mut self) -> Option<ClientEvent> {
        let pending = self
            .pending
            .iter_mut()
            .find(|p| p.state == SendState::Failed)?;
        pending.state = SendState::InFlight;
        Some(ClientEvent::SendMessage {
            content: pending.content.clone(),
        })
    }

    /// Folds one socket event into the view.
    pub fn apply_event(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::NewMessage { message } => {
                // At-least-once transport: duplicates are dropped here.
                if !self.seen.insert(message.message_id) {
                    return;
                }
                if message.sender_type == SenderType::Visitor {
                    // Our own echo confirms the oldest in-flight send.
                    if let Some(index) = self.pending.iter().position(|p| {
                        p.state == SendState::InFlight && p.content == message.content
                    }) {
                        self.pending.remove(index);
                    }
                } else {
                    self.typing.clear();
                }
                self.messages.push(message.clone());
            }
            ServerEvent::UserTyping { sender_type } => {
                if *sender_type == SenderType::Agent {
                    self.typing.refresh();
                }
            }
            ServerEvent::MessagesRead => {
                for message in self
                    .messages
                    .iter_mut()
                    .filter(|m| m.sender_type == SenderType::Agent)
                {
                    message.delivery_status = DeliveryStatus::Read;
                }
            }
            ServerEvent::Error { .. } => {
                // A send failed: the message stays out of the
                // transcript and the pending entry turns retryable.
                if let Some(pending) = self
                    .pending
                    .iter_mut()
                    .find(|p| p.state == SendState::InFlight)
                {
                    pending.state = SendState::Failed;
                }
            }
            // Dashboard-only events; a widget socket never gets them.
            ServerEvent::UserStatus { .. } | ServerEvent::ConversationUpdated { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(id: i32, sender_type: SenderType, content: &str) -> MessageDTO {
        MessageDTO {
            message_id: id,
            conversation_id: 1,
            sender_type,
            content: content.to_string(),
            delivery_status: DeliveryStatus::Sent,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_deliveries_are_dropped() {
        let mut transcript = WidgetTranscript::new();
        let event = ServerEvent::NewMessage {
            message: message(1, SenderType::Agent, "Olá!"),
        };

        transcript.apply_event(&event);
        transcript.apply_event(&event);

        assert_eq!(transcript.messages().len(), 1);
    }

    #[test]
    fn bootstrap_history_dedupes_against_live_events() {
        let mut transcript = WidgetTranscript::new();
        transcript.bootstrap(vec![message(1, SenderType::Agent, "Olá!")]);

        transcript.apply_event(&ServerEvent::NewMessage {
            message: message(1, SenderType::Agent, "Olá!"),
        });

        assert_eq!(transcript.messages().len(), 1);
    }

    #[test]
    fn own_echo_confirms_the_pending_send() {
        let mut transcript = WidgetTranscript::new();
        transcript.begin_send("Olá, tem garagem?");
        assert_eq!(transcript.pending().len(), 1);

        transcript.apply_event(&ServerEvent::NewMessage {
            message: message(5, SenderType::Visitor, "Olá, tem garagem?"),
        });

        assert!(transcript.pending().is_empty());
        assert_eq!(transcript.messages().len(), 1);
    }

    #[test]
    fn failed_send_is_retryable_and_absent_from_transcript() {
        let mut transcript = WidgetTranscript::new();
        transcript.begin_send("Olá!");

        transcript.apply_event(&ServerEvent::Error {
            code: 503,
            message: "Store unavailable".to_string(),
        });

        assert!(transcript.messages().is_empty());
        assert_eq!(transcript.pending()[0].state, SendState::Failed);

        let retry = transcript.retry_failed();
        assert!(matches!(retry, Some(ClientEvent::SendMessage { .. })));
        assert_eq!(transcript.pending()[0].state, SendState::InFlight);
    }

    #[test]
    fn agent_typing_lights_and_message_clears_it() {
        let mut transcript = WidgetTranscript::new();
        transcript.apply_event(&ServerEvent::UserTyping {
            sender_type: SenderType::Agent,
        });
        assert!(transcript.agent_typing());

        transcript.apply_event(&ServerEvent::NewMessage {
            message: message(2, SenderType::Agent, "Tem sim!"),
        });
        assert!(!transcript.agent_typing());
    }

    #[test]
    fn messages_read_marks_agent_messages() {
        let mut transcript = WidgetTranscript::new();
        transcript.bootstrap(vec![
            message(1, SenderType::Agent, "Olá!"),
            message(2, SenderType::Visitor, "Olá, tem garagem?"),
        ]);

        transcript.apply_event(&ServerEvent::MessagesRead);

        assert_eq!(transcript.messages()[0].delivery_status, DeliveryStatus::Read);
        assert_eq!(transcript.messages()[1].delivery_status, DeliveryStatus::Sent);
    }
}
