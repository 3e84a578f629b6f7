//! Authoritative in-memory collection of active rooms
//!
//! All mutations take a single write lock over the room list, so a create
//! (drop old room, insert new one, strip its members elsewhere) is observed
//! by other commands either entirely or not at all.

use crate::error::{MatchmakingError, Result};
use crate::room::instance::Room;
use crate::room::provider::SlotProvider;
use crate::types::{RoomId, RoomSlot, RoomState, User, UserId};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Statistics about registry operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Total number of rooms created
    pub rooms_created: u64,
    /// Rooms dropped because their host created a new one
    pub rooms_replaced: u64,
    /// Rooms dropped because every member moved elsewhere
    pub rooms_pruned: u64,
    /// Times control passed to another member after the host left
    pub host_migrations: u64,
    /// Current number of rooms
    pub active_rooms: usize,
    /// Current number of users in any room
    pub members_in_rooms: usize,
}

#[derive(Debug, Default)]
struct RegistryInner {
    rooms: Vec<Room>,
    stats: RegistryStats,
}

impl RegistryInner {
    fn remove_all_hosted_by(&mut self, user_id: UserId) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|room| !room.is_hosted_by(user_id));
        let removed = before - self.rooms.len();
        self.stats.rooms_replaced += removed as u64;
        removed
    }

    fn refresh_gauges(&mut self) {
        self.stats.active_rooms = self.rooms.len();
        self.stats.members_in_rooms = self.rooms.iter().map(|r| r.members().len()).sum();
    }
}

/// The room registry shared by every command execution
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<RwLock<RegistryInner>>,
    slot_provider: Arc<dyn SlotProvider>,
}

impl RoomRegistry {
    pub fn new(slot_provider: Arc<dyn SlotProvider>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner::default())),
            slot_provider,
        }
    }

    /// Create a room hosted by `host` with the given (already resolved) members.
    ///
    /// Any room previously hosted by `host` is dropped first. Afterwards the
    /// new room's members are removed from every other room; rooms left empty
    /// are pruned and rooms that lost their host hand control to their next
    /// member.
    pub fn create_room(&self, host: &User, members: Vec<User>, slot: RoomSlot) -> Result<Room> {
        let capacity = self.slot_provider.capacity_for(slot);
        let room = Room::new(host.clone(), members, slot, capacity);

        if room.members().len() > capacity {
            return Err(MatchmakingError::RoomTooLarge {
                requested: room.members().len(),
                capacity,
            }
            .into());
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("rooms"))?;

        let replaced = inner.remove_all_hosted_by(host.user_id);
        if replaced > 0 {
            debug!("Dropped {} room(s) previously hosted by '{}'", replaced, host.username);
        }

        let moved: HashSet<UserId> = room.member_ids().into_iter().collect();
        let mut migrations = 0;
        for other in inner.rooms.iter_mut() {
            let previous_host = other.host().user_id;
            if other.strip_members(&moved) > 0
                && !other.is_empty()
                && other.host().user_id != previous_host
            {
                info!(
                    "Room {} host '{}' moved away, control passed to '{}'",
                    other.id(),
                    previous_host,
                    other.host().username
                );
                migrations += 1;
            }
        }

        let before = inner.rooms.len();
        inner.rooms.retain(|r| !r.is_empty());
        let pruned = before - inner.rooms.len();

        inner.rooms.push(room.clone());
        inner.stats.rooms_created += 1;
        inner.stats.rooms_pruned += pruned as u64;
        inner.stats.host_migrations += migrations;
        inner.refresh_gauges();

        info!(
            "Created room {} - host: '{}', members: {}/{}, slot: {:?}, pruned: {}",
            room.id(),
            host.username,
            room.members().len(),
            capacity,
            slot,
            pruned
        );

        Ok(room)
    }

    /// Remove every room hosted by `user_id`; returns how many were removed
    pub fn remove_all_hosted_by(&self, user_id: UserId) -> Result<usize> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("rooms"))?;
        let removed = inner.remove_all_hosted_by(user_id);
        inner.refresh_gauges();
        Ok(removed)
    }

    /// First room whose host is `user_id`
    pub fn find_by_host_user(&self, user_id: UserId) -> Result<Option<Room>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("rooms"))?;
        Ok(inner.rooms.iter().find(|r| r.is_hosted_by(user_id)).cloned())
    }

    /// Room that lists `user_id` among its members
    pub fn find_by_member(&self, user_id: UserId) -> Result<Option<Room>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("rooms"))?;
        Ok(inner.rooms.iter().find(|r| r.contains(user_id)).cloned())
    }

    pub fn get(&self, room_id: RoomId) -> Result<Option<Room>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("rooms"))?;
        Ok(inner.rooms.iter().find(|r| r.id() == room_id).cloned())
    }

    /// Change a room's state on behalf of `caller`.
    ///
    /// Returns `false` without touching the room when the caller is not its
    /// host or the room no longer exists.
    pub fn set_state(&self, room_id: RoomId, caller: UserId, state: RoomState) -> Result<bool> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("rooms"))?;

        let applied = inner
            .rooms
            .iter_mut()
            .find(|r| r.id() == room_id)
            .is_some_and(|room| room.set_state(caller, state));

        if applied {
            debug!("Room {} state set to {} by {}", room_id, state, caller);
        } else {
            debug!("Ignored state change for room {} from {}", room_id, caller);
        }
        Ok(applied)
    }

    /// Consistent copy of every room, in insertion order
    pub fn snapshot(&self) -> Result<Vec<Room>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("rooms"))?;
        Ok(inner.rooms.clone())
    }

    pub fn len(&self) -> Result<usize> {
        let inner = self
            .inner
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("rooms"))?;
        Ok(inner.rooms.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn stats(&self) -> Result<RegistryStats> {
        let inner = self
            .inner
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("rooms"))?;
        Ok(inner.stats.clone())
    }
}
