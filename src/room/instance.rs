//! A single room and its membership

use crate::types::{RoomId, RoomSlot, RoomState, User, UserId};
use crate::utils::{current_timestamp, generate_room_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ephemeral session grouping with a host and bounded membership
///
/// The host is always `members[0]` while the room is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    id: RoomId,
    host: User,
    members: Vec<User>,
    state: RoomState,
    slot: RoomSlot,
    capacity: usize,
    created_at: DateTime<Utc>,
}

impl Room {
    /// Build a room hosted by `host`. The host is placed first and duplicate
    /// users are dropped, keeping first occurrence order.
    pub fn new(host: User, members: Vec<User>, slot: RoomSlot, capacity: usize) -> Self {
        Self {
            id: generate_room_id(),
            members: ordered_members(&host, members),
            host,
            state: RoomState::Idle,
            slot,
            capacity,
            created_at: current_timestamp(),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn host(&self) -> &User {
        &self.host
    }

    pub fn members(&self) -> &[User] {
        &self.members
    }

    pub fn member_ids(&self) -> Vec<UserId> {
        self.members.iter().map(|m| m.user_id).collect()
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn slot(&self) -> RoomSlot {
        self.slot
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_hosted_by(&self, user_id: UserId) -> bool {
        self.host.user_id == user_id
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.members.len())
    }

    pub fn has_capacity(&self) -> bool {
        self.free_slots() > 0
    }

    /// Apply a state change requested by `caller`. Non-hosts are ignored.
    pub fn set_state(&mut self, caller: UserId, state: RoomState) -> bool {
        if !self.is_hosted_by(caller) {
            return false;
        }
        self.state = state;
        true
    }

    /// Drop every member listed in `user_ids`. Returns how many were removed.
    ///
    /// If the host was removed and members remain, the first remaining member
    /// takes over as host.
    pub(crate) fn strip_members(&mut self, user_ids: &HashSet<UserId>) -> usize {
        let before = self.members.len();
        self.members.retain(|m| !user_ids.contains(&m.user_id));
        let removed = before - self.members.len();

        if removed > 0 && !self.contains(self.host.user_id) {
            if let Some(next_host) = self.members.first() {
                self.host = next_host.clone();
            }
        }

        removed
    }
}

fn ordered_members(host: &User, members: Vec<User>) -> Vec<User> {
    let mut seen = HashSet::new();
    std::iter::once(host.clone())
        .chain(members)
        .filter(|user| seen.insert(user.user_id))
        .collect()
}
