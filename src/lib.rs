//! Matchroom - matchmaking coordination for peer-hosted game rooms
//!
//! This crate tracks where players connect from and who they recently played
//! with, keeps the registry of active rooms, picks the best existing room for
//! a searching player, and exposes all of it through a single HTTP command
//! endpoint.

pub mod config;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod protocol;
pub mod room;
pub mod service;
pub mod tracking;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use protocol::{MatchCodec, MatchCommand, MatchResponse};
pub use room::{BestRoomSelector, RoomRegistry, RoomScorer, SlotProvider, StaticSlotProvider};
pub use service::{AppState, CommandProcessor, MatchState};
pub use tracking::{LocationTracker, RecencyTracker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
