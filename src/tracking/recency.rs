//! Partners each user was recently grouped with
//!
//! The window per user is bounded; once full, recording a new partner evicts
//! the oldest one.

use crate::error::{MatchmakingError, Result};
use crate::types::UserId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;
use tracing::debug;

/// Per-user recency window, oldest partner first
#[derive(Debug)]
pub struct RecencyTracker {
    partners: RwLock<HashMap<UserId, VecDeque<UserId>>>,
    capacity: usize,
}

impl RecencyTracker {
    /// Create a tracker remembering at most `capacity` partners per user
    pub fn new(capacity: usize) -> Self {
        Self {
            partners: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Add partners to `user_id`'s window. One-directional.
    ///
    /// Re-recording a known partner refreshes its position instead of duplicating it.
    pub fn record_pairs(&self, user_id: UserId, partners: &[UserId]) -> Result<()> {
        let mut all = self
            .partners
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("recency"))?;

        let window = all.entry(user_id).or_default();
        for &partner in partners {
            if partner == user_id {
                continue;
            }
            window.retain(|existing| *existing != partner);
            window.push_back(partner);
            while window.len() > self.capacity {
                if let Some(evicted) = window.pop_front() {
                    debug!("Recency window for {} full, evicted {}", user_id, evicted);
                }
            }
        }

        Ok(())
    }

    /// Whether `partner` is in `user_id`'s recency window
    pub fn contains(&self, user_id: UserId, partner: UserId) -> Result<bool> {
        let all = self
            .partners
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("recency"))?;
        Ok(all
            .get(&user_id)
            .is_some_and(|window| window.contains(&partner)))
    }

    /// Snapshot of the recent partners of a user
    pub fn partners_of(&self, user_id: UserId) -> Result<HashSet<UserId>> {
        let all = self
            .partners
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("recency"))?;
        Ok(all
            .get(&user_id)
            .map(|window| window.iter().copied().collect())
            .unwrap_or_default())
    }

    /// Number of users with a non-empty window
    pub fn tracked_users(&self) -> Result<usize> {
        let all = self
            .partners
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("recency"))?;
        Ok(all.values().filter(|window| !window.is_empty()).count())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecencyTracker {
    fn default() -> Self {
        Self::new(16)
    }
}
