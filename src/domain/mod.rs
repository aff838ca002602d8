//! Domain entities for the messaging core.
//!
//! These are the persisted shapes the store adapter hands back to the
//! gateway; one file per entity, enums shared in their own module.

pub mod conversation;
pub mod enums;
pub mod message;
pub mod visitor;

pub use conversation::Conversation;
pub use enums::{DeliveryStatus, SenderType};
pub use message::Message;
pub use visitor::VisitorIdentity;
