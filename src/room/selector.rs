//! Best-room selection for a searching user
//!
//! Eligibility and the recency preference are fixed policy; how eligible rooms
//! are ranked against each other is delegated to a [`RoomScorer`].

use crate::error::Result;
use crate::room::instance::Room;
use crate::room::registry::RoomRegistry;
use crate::tracking::{LocationTracker, RecencyTracker};
use crate::types::{User, UserId};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Inputs available to a scorer for one candidate room
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub searcher_location: &'a str,
    pub host_location: Option<&'a str>,
    /// Members of the room the searcher was recently grouped with
    pub recent_members: usize,
}

/// Trait for ranking candidate rooms (higher = better fit)
pub trait RoomScorer: Send + Sync {
    fn score(&self, room: &Room, context: &ScoringContext<'_>) -> f64;
}

/// Default scorer: prefers fuller rooms and rooms whose host reported the
/// same location as the searcher.
#[derive(Debug, Clone)]
pub struct ProximityScorer {
    pub fullness_weight: f64,
    pub same_location_bonus: f64,
}

impl Default for ProximityScorer {
    fn default() -> Self {
        Self {
            fullness_weight: 50.0,
            same_location_bonus: 25.0,
        }
    }
}

impl ProximityScorer {
    fn fullness_score(&self, room: &Room) -> f64 {
        if room.capacity() == 0 {
            return 0.0;
        }
        let ratio = room.members().len() as f64 / room.capacity() as f64;
        ratio * self.fullness_weight
    }

    fn location_score(&self, context: &ScoringContext<'_>) -> f64 {
        match context.host_location {
            Some(host) if !host.is_empty() && host == context.searcher_location => {
                self.same_location_bonus
            }
            _ => 0.0,
        }
    }
}

impl RoomScorer for ProximityScorer {
    fn score(&self, room: &Room, context: &ScoringContext<'_>) -> f64 {
        self.fullness_score(room) + self.location_score(context)
    }
}

/// Room chosen for a searcher
#[derive(Debug, Clone)]
pub struct RoomMatchResult {
    pub room: Room,
    pub score: f64,
    pub recent_members: usize,
}

impl RoomMatchResult {
    /// Identities of the chosen room's members
    pub fn member_ids(&self) -> Vec<UserId> {
        self.room.member_ids()
    }
}

/// Chooses the best existing room for a searching user
#[derive(Clone)]
pub struct BestRoomSelector {
    scorer: Arc<dyn RoomScorer>,
}

impl BestRoomSelector {
    pub fn new(scorer: Arc<dyn RoomScorer>) -> Self {
        Self { scorer }
    }

    /// Select a room for `searcher` from the registry's current rooms.
    ///
    /// Callers only invoke this once enough users have reported a location.
    pub fn select_best_room(
        &self,
        searcher: &User,
        searcher_location: &str,
        registry: &RoomRegistry,
        recency: &RecencyTracker,
        locations: &LocationTracker,
    ) -> Result<Option<RoomMatchResult>> {
        let rooms = registry.snapshot()?;
        let recent = recency.partners_of(searcher.user_id)?;
        let hosts: Vec<UserId> = rooms.iter().map(|r| r.host().user_id).collect();
        let host_locations = locations.snapshot_for(&hosts)?;

        Ok(self.choose(searcher, searcher_location, &rooms, &recent, &host_locations))
    }

    /// Pure selection over an already captured set of rooms
    pub fn choose(
        &self,
        searcher: &User,
        searcher_location: &str,
        rooms: &[Room],
        recent: &HashSet<UserId>,
        host_locations: &HashMap<UserId, String>,
    ) -> Option<RoomMatchResult> {
        let mut best: Option<RoomMatchResult> = None;

        for room in rooms.iter().filter(|r| is_eligible(searcher, r)) {
            let recent_members = room
                .members()
                .iter()
                .filter(|m| recent.contains(&m.user_id))
                .count();
            let context = ScoringContext {
                searcher_location,
                host_location: host_locations.get(&room.host().user_id).map(String::as_str),
                recent_members,
            };
            let candidate = RoomMatchResult {
                room: room.clone(),
                score: self.scorer.score(room, &context),
                recent_members,
            };

            debug!(
                "Candidate room {} for '{}' - score: {:.1}, recent members: {}",
                room.id(),
                searcher.username,
                candidate.score,
                recent_members
            );

            best = match best {
                Some(current) if compare(&candidate, &current) != Ordering::Greater => {
                    Some(current)
                }
                _ => Some(candidate),
            };
        }

        best
    }
}

impl Default for BestRoomSelector {
    fn default() -> Self {
        Self::new(Arc::new(ProximityScorer::default()))
    }
}

fn is_eligible(searcher: &User, room: &Room) -> bool {
    room.has_capacity() && !room.is_hosted_by(searcher.user_id) && !room.contains(searcher.user_id)
}

/// Rooms free of recent partners win outright; then score, then fewer recent
/// partners. Equal candidates keep the earlier room.
fn compare(a: &RoomMatchResult, b: &RoomMatchResult) -> Ordering {
    let fresh_a = a.recent_members == 0;
    let fresh_b = b.recent_members == 0;
    fresh_a
        .cmp(&fresh_b)
        .then(a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal))
        .then(b.recent_members.cmp(&a.recent_members))
}
