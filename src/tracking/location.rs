//! Last reported network location per user

use crate::error::{MatchmakingError, Result};
use crate::types::UserId;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Map of user → last-known location hint
///
/// Entries are overwritten on every update and never expire.
#[derive(Debug, Default)]
pub struct LocationTracker {
    locations: RwLock<HashMap<UserId, String>>,
}

impl LocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the user's location, replacing any previous one
    pub fn set_location(&self, user_id: UserId, location: impl Into<String>) -> Result<()> {
        let location = location.into();
        let mut locations = self
            .locations
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("locations"))?;

        debug!("Location for user {} set to '{}'", user_id, location);
        locations.insert(user_id, location);
        Ok(())
    }

    /// Last known location of a user
    pub fn location_of(&self, user_id: UserId) -> Result<Option<String>> {
        let locations = self
            .locations
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("locations"))?;
        Ok(locations.get(&user_id).cloned())
    }

    /// Locations for several users, in the given order, skipping unknown users
    pub fn locations_of(&self, user_ids: &[UserId]) -> Result<Vec<String>> {
        let locations = self
            .locations
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("locations"))?;
        Ok(user_ids
            .iter()
            .filter_map(|id| locations.get(id).cloned())
            .collect())
    }

    /// Location lookup table restricted to the given users
    pub fn snapshot_for(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, String>> {
        let locations = self
            .locations
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("locations"))?;
        Ok(user_ids
            .iter()
            .filter_map(|id| locations.get(id).map(|loc| (*id, loc.clone())))
            .collect())
    }

    /// Number of distinct users with a recorded location
    pub fn count(&self) -> Result<usize> {
        let locations = self
            .locations
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("locations"))?;
        Ok(locations.len())
    }
}
