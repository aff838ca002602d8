//! Application state shared across routes, middleware and the gateway.

use crate::rooms::{PresenceTracker, RoomRegistry};
use crate::store::ConversationStore;
use std::sync::Arc;

pub struct AppState {
    /// Boundary to the durable conversation/message store.
    pub store: Arc<dyn ConversationStore>,

    /// Live room membership. Owned by the messaging gateway: every
    /// mutation funnels through gateway code paths.
    pub rooms: RoomRegistry,

    /// Online/offline state derived from user-room transitions.
    pub presence: PresenceTracker,

    /// Secret used to validate agent session tokens.
    pub jwt_secret: String,

    /// Shared static key the embeddable widget presents.
    pub widget_api_key: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        jwt_secret: String,
        widget_api_key: String,
    ) -> Self {
        Self {
            store,
            rooms: RoomRegistry::new(),
            presence: PresenceTracker::new(),
            jwt_secret,
            widget_api_key,
        }
    }
}
