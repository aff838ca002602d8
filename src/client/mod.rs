//! Client controller contracts.
//!
//! Transport-agnostic state machines for the two socket consumers: the
//! agent dashboard and the embeddable visitor widget. A frontend wires
//! these to its actual websocket; everything here is pure logic so the
//! reconnection, typing-expiry and reconciliation behavior is testable
//! without a transport.

pub mod connection;
pub mod dashboard;
pub mod typing;
pub mod widget;

pub use connection::{BackoffPolicy, ConnectionState, ConnectionStateMachine, ReconnectDecision};
pub use dashboard::{ConversationListView, PendingArchive};
pub use typing::TypingState;
pub use widget::WidgetTranscript;
