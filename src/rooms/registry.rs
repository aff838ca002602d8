//! Room registry: who is listening to what.
//!
//! Rooms are keyed by conversation id (transcript fan-out) or user id
//! (presence + conversation-list fan-out). Each member is a live socket
//! handle: a uuid plus the unbounded sender feeding that socket's write
//! task. Mutations are serialized per room key by the map's shard
//! locking; sends are non-blocking, so no lock is ever held across an
//! await point and a slow consumer can never stall a broadcast.

use crate::dtos::ServerEvent;
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// One conversation maps to exactly one conversation room; one user to
/// exactly one user room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKey {
    Conversation(i32),
    User(i32),
}

pub struct RoomRegistry {
    rooms: DashMap<RoomKey, HashMap<Uuid, UnboundedSender<ServerEvent>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Adds the socket to the room. Idempotent: re-joining refreshes
    /// the stored sender and nothing else.
    #[instrument(skip(self, tx))]
    pub fn join(&self, key: RoomKey, socket_id: Uuid, tx: UnboundedSender<ServerEvent>) {
        let mut members = self.rooms.entry(key).or_default();
        members.insert(socket_id, tx);
        debug!(room_size = members.len(), "Socket joined room");
    }

    /// Removes the socket and reclaims the room when its member set
    /// empties. Returns the remaining member count so the gateway can
    /// feed presence recomputation.
    #[instrument(skip(self))]
    pub fn leave(&self, key: RoomKey, socket_id: &Uuid) -> usize {
        let remaining = match self.rooms.get_mut(&key) {
            Some(mut members) => {
                members.remove(socket_id);
                members.len()
            }
            None => return 0,
        };
        if remaining == 0 {
            // Guard against a join that slipped in after the count.
            self.rooms.remove_if(&key, |_, members| members.is_empty());
            debug!("Empty room reclaimed");
        }
        remaining
    }

    /// Snapshot of current members. Unknown rooms yield an empty set,
    /// never an error.
    pub fn members_of(&self, key: RoomKey) -> Vec<Uuid> {
        self.rooms
            .get(&key)
            .map(|members| members.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn member_count(&self, key: RoomKey) -> usize {
        self.rooms.get(&key).map(|members| members.len()).unwrap_or(0)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Delivers `event` to every member. Sockets whose channel is gone
    /// are dropped silently; their registry entries go away with the
    /// disconnect cleanup. Returns how many members were reached.
    pub fn broadcast(&self, key: RoomKey, event: &ServerEvent) -> usize {
        self.broadcast_filtered(key, event, None)
    }

    /// Same as [`broadcast`](Self::broadcast) minus one member; typing
    /// is never echoed back to its sender.
    pub fn broadcast_except(&self, key: RoomKey, except: &Uuid, event: &ServerEvent) -> usize {
        self.broadcast_filtered(key, event, Some(except))
    }

    fn broadcast_filtered(
        &self,
        key: RoomKey,
        event: &ServerEvent,
        except: Option<&Uuid>,
    ) -> usize {
        // Snapshot the senders, then release the shard before sending.
        let targets: Vec<(Uuid, UnboundedSender<ServerEvent>)> = {
            let Some(members) = self.rooms.get(&key) else {
                return 0;
            };
            let mut targets = Vec::with_capacity(members.len());
            for (id, tx) in members.iter() {
                if except == Some(id) {
                    continue;
                }
                targets.push((*id, tx.clone()));
            }
            targets
        };

        let mut reached = 0;
        for (socket_id, tx) in targets {
            if tx.send(event.clone()).is_ok() {
                reached += 1;
            } else {
                warn!(%socket_id, "Dropping event for closed socket");
            }
        }
        reached
    }

    /// Fans `event` out to every member of every user room: the
    /// audience for presence changes and conversation-list updates.
    /// Widget and conversation sockets are never in a user room, so
    /// agent-only data cannot leak through here.
    pub fn broadcast_to_users(&self, event: &ServerEvent) -> usize {
        let targets: Vec<UnboundedSender<ServerEvent>> = self
            .rooms
            .iter()
            .filter(|entry| matches!(entry.key(), RoomKey::User(_)))
            .flat_map(|entry| entry.value().values().cloned().collect::<Vec<_>>())
            .collect();

        let mut reached = 0;
        for tx in targets {
            if tx.send(event.clone()).is_ok() {
                reached += 1;
            }
        }
        reached
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn member() -> (
        Uuid,
        UnboundedSender<ServerEvent>,
        mpsc::UnboundedReceiver<ServerEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Uuid::new_v4(), tx, rx)
    }

    #[test]
    fn join_leave_reclaims_empty_room() {
        let registry = RoomRegistry::new();
        let key = RoomKey::Conversation(1);
        let (id, tx, _rx) = member();

        registry.join(key, id, tx);
        assert_eq!(registry.member_count(key), 1);
        assert_eq!(registry.room_count(), 1);

        assert_eq!(registry.leave(key, &id), 0);
        assert_eq!(registry.room_count(), 0);
        assert!(registry.members_of(key).is_empty());
    }

    #[test]
    fn join_is_idempotent() {
        let registry = RoomRegistry::new();
        let key = RoomKey::Conversation(1);
        let (id, tx, mut rx) = member();

        registry.join(key, id, tx.clone());
        registry.join(key, id, tx);
        assert_eq!(registry.member_count(key), 1);

        // Exactly one delivery even after the double join.
        registry.broadcast(key, &ServerEvent::MessagesRead);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn broadcast_stays_inside_the_room() {
        let registry = RoomRegistry::new();
        let room_a = RoomKey::Conversation(1);
        let room_b = RoomKey::Conversation(2);
        let (id_a, tx_a, mut rx_a) = member();
        let (id_b, tx_b, mut rx_b) = member();
        registry.join(room_a, id_a, tx_a);
        registry.join(room_b, id_b, tx_b);

        let reached = registry.broadcast(room_a, &ServerEvent::MessagesRead);

        assert_eq!(reached, 1);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn broadcast_except_skips_the_sender() {
        let registry = RoomRegistry::new();
        let key = RoomKey::Conversation(1);
        let (id_a, tx_a, mut rx_a) = member();
        let (id_b, tx_b, mut rx_b) = member();
        registry.join(key, id_a, tx_a);
        registry.join(key, id_b, tx_b);

        registry.broadcast_except(key, &id_a, &ServerEvent::MessagesRead);

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn broadcast_to_unknown_room_is_a_noop() {
        let registry = RoomRegistry::new();
        assert_eq!(
            registry.broadcast(RoomKey::Conversation(99), &ServerEvent::MessagesRead),
            0
        );
    }

    #[test]
    fn dead_members_are_dropped_silently() {
        let registry = RoomRegistry::new();
        let key = RoomKey::Conversation(1);
        let (id_dead, tx_dead, rx_dead) = member();
        let (id_live, tx_live, mut rx_live) = member();
        registry.join(key, id_dead, tx_dead);
        registry.join(key, id_live, tx_live);
        drop(rx_dead);

        let reached = registry.broadcast(key, &ServerEvent::MessagesRead);

        assert_eq!(reached, 1);
        assert!(rx_live.try_recv().is_ok());
    }

    #[test]
    fn user_fanout_skips_conversation_rooms() {
        let registry = RoomRegistry::new();
        let (id_user, tx_user, mut rx_user) = member();
        let (id_conv, tx_conv, mut rx_conv) = member();
        registry.join(RoomKey::User(7), id_user, tx_user);
        registry.join(RoomKey::Conversation(1), id_conv, tx_conv);

        let reached = registry.broadcast_to_users(&ServerEvent::UserStatus {
            user_id: 7,
            online: true,
        });

        assert_eq!(reached, 1);
        assert!(rx_user.try_recv().is_ok());
        assert!(rx_conv.try_recv().is_err());
    }
}
