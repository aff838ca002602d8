//! Presence tracking derived from user-room membership.

use dashmap::DashMap;

/// Translates user-room membership transitions into online/offline
/// flips. A user is online iff their user-room member set is non-empty,
/// so a second browser tab joining or one of several tabs closing never
/// produces a notification — only the empty/non-empty edges do.
pub struct PresenceTracker {
    online: DashMap<i32, bool>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self {
            online: DashMap::new(),
        }
    }

    /// Feeds the member count observed after a user-room join or leave.
    /// Returns `Some(online)` only when the known state flipped.
    pub fn observe(&self, user_id: i32, member_count: usize) -> Option<bool> {
        let online_now = member_count > 0;
        let mut entry = self.online.entry(user_id).or_insert(false);
        if *entry == online_now {
            None
        } else {
            *entry = online_now;
            Some(online_now)
        }
    }

    pub fn is_online(&self, user_id: i32) -> bool {
        self.online.get(&user_id).map(|v| *v).unwrap_or(false)
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_connection_flips_online() {
        let presence = PresenceTracker::new();
        assert_eq!(presence.observe(1, 1), Some(true));
        assert!(presence.is_online(1));
    }

    #[test]
    fn second_tab_is_silent_and_offline_waits_for_last_close() {
        let presence = PresenceTracker::new();
        assert_eq!(presence.observe(1, 1), Some(true));

        // Second tab joins: still online, no notification.
        assert_eq!(presence.observe(1, 2), None);

        // First tab closes: one connection left, still online.
        assert_eq!(presence.observe(1, 1), None);

        // Last tab closes: now, and only now, offline.
        assert_eq!(presence.observe(1, 0), Some(false));
        assert!(!presence.is_online(1));
    }

    #[test]
    fn unknown_user_disconnect_is_not_a_spurious_offline() {
        let presence = PresenceTracker::new();
        assert_eq!(presence.observe(9, 0), None);
        assert!(!presence.is_online(9));
    }
}
