//! Data Transfer Objects.
//!
//! DTOs separate the wire representation (REST responses, socket
//! events) from the domain entities the store hands back.

pub mod conversation;
pub mod message;
pub mod query;
pub mod widget;
pub mod ws_event;

pub use conversation::ConversationDTO;
pub use message::{MessageDTO, SendMessageDTO};
pub use query::ConversationsQuery;
pub use widget::{SessionDTO, StartSessionDTO};
pub use ws_event::{ClientEvent, ServerEvent};
