//! In-memory room membership and presence.
//!
//! The registry is the only mutable shared resource in the core. It is
//! owned by the messaging gateway; nothing else mutates it.

pub mod presence;
pub mod registry;

pub use presence::PresenceTracker;
pub use registry::{RoomKey, RoomRegistry};
