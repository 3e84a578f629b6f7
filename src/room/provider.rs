//! Slot capacity configuration
//!
//! Rooms are sized by their slot type: each type may carry its own capacity,
//! everything else falls back to the default.

use crate::config::MatchmakingSettings;
use crate::error::{MatchmakingError, Result};
use crate::types::RoomSlot;
use std::collections::BTreeMap;

/// Trait for providing the capacity of a room slot
pub trait SlotProvider: Send + Sync {
    /// Maximum number of members a room using this slot may hold
    fn capacity_for(&self, slot: RoomSlot) -> usize;
}

/// Capacity table loaded from configuration
#[derive(Debug, Clone)]
pub struct StaticSlotProvider {
    default_capacity: usize,
    overrides: BTreeMap<i32, usize>,
}

impl StaticSlotProvider {
    pub fn new(default_capacity: usize) -> Self {
        Self {
            default_capacity,
            overrides: BTreeMap::new(),
        }
    }

    /// Build from the matchmaking section of the app config
    pub fn from_settings(settings: &MatchmakingSettings) -> Result<Self> {
        let provider = Self {
            default_capacity: settings.default_room_capacity,
            overrides: settings
                .slot_capacities
                .iter()
                .map(|entry| (entry.slot_type, entry.capacity))
                .collect(),
        };
        provider.validate()?;
        Ok(provider)
    }

    /// Override the capacity of one slot type
    pub fn with_capacity(mut self, slot_type: i32, capacity: usize) -> Self {
        self.overrides.insert(slot_type, capacity);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.default_capacity == 0 || self.overrides.values().any(|c| *c == 0) {
            return Err(MatchmakingError::ConfigurationError {
                message: "Slot capacities must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl Default for StaticSlotProvider {
    fn default() -> Self {
        Self::new(4)
    }
}

impl SlotProvider for StaticSlotProvider {
    fn capacity_for(&self, slot: RoomSlot) -> usize {
        self.overrides
            .get(&slot.slot_type)
            .copied()
            .unwrap_or(self.default_capacity)
    }
}
