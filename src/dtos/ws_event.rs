//! Socket event DTOs.
//!
//! Both directions are closed tagged unions, so adding an event kind is
//! an exhaustive-match affair rather than a stringly-typed dispatch.
//! Wire shape: `{"type": "new_message", "message": {...}}`.

use crate::domain::SenderType;
use crate::dtos::{ConversationDTO, MessageDTO};
use serde::{Deserialize, Serialize};

/// Events a connected client may send. All are fire-and-forget; the
/// gateway never returns a synchronous ack payload.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    SendMessage { content: String },
    Typing,
    MarkRead,
    MarkMessagesRead,
    Archive,
    Unarchive,
}

/// Events the gateway fans out to subscribed sockets.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    NewMessage {
        message: MessageDTO,
    },
    UserTyping {
        sender_type: SenderType,
    },
    MessagesRead,
    UserStatus {
        user_id: i32,
        online: bool,
    },
    /// Refreshed conversation snapshot for dashboard list views; only
    /// ever delivered through user rooms, never to widget sockets.
    ConversationUpdated {
        conversation: ConversationDTO,
    },
    /// Per-event failure addressed to the initiating socket only.
    Error {
        code: u16,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_event_tags_are_snake_case() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"send_message","content":"Olá"}"#).unwrap();
        assert!(matches!(event, ClientEvent::SendMessage { content } if content == "Olá"));

        let event: ClientEvent = serde_json::from_str(r#"{"type":"typing"}"#).unwrap();
        assert!(matches!(event, ClientEvent::Typing));
    }

    #[test]
    fn server_event_shapes_match_contract() {
        let json = serde_json::to_string(&ServerEvent::UserStatus {
            user_id: 7,
            online: true,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"user_status","user_id":7,"online":true}"#);

        let json = serde_json::to_string(&ServerEvent::MessagesRead).unwrap();
        assert_eq!(json, r#"{"type":"messages_read"}"#);

        let json = serde_json::to_string(&ServerEvent::UserTyping {
            sender_type: SenderType::Visitor,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"user_typing","sender_type":"visitor"}"#);
    }

    #[test]
    fn unknown_inbound_type_is_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"shrug"}"#).is_err());
    }
}
