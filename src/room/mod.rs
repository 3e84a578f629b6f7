//! Room management for the matchmaking service
//!
//! This module holds the in-memory room registry, per-slot capacity
//! configuration and the best-room selection policy.

pub mod instance;
pub mod provider;
pub mod registry;
pub mod selector;

// Re-export commonly used types
pub use instance::Room;
pub use provider::{SlotProvider, StaticSlotProvider};
pub use registry::{RegistryStats, RoomRegistry};
pub use selector::{BestRoomSelector, ProximityScorer, RoomMatchResult, RoomScorer, ScoringContext};
