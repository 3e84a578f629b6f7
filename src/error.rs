//! Error types for the matchmaking service
//!
//! Operations return `anyhow::Result`; the typed variants below are the ones
//! the HTTP layer knows how to turn into a status code.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Request is not authenticated")]
    Unauthorized,

    #[error("Invalid match payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("Unknown user: {username}")]
    UnknownUser { username: String },

    #[error("Room of {requested} members exceeds slot capacity {capacity}")]
    RoomTooLarge { requested: usize, capacity: usize },

    #[error("No suitable room found")]
    NoRoomFound,

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl MatchmakingError {
    /// HTTP status code reported to the client for this error
    pub fn status_code(&self) -> u16 {
        match self {
            MatchmakingError::Unauthorized => 403,
            MatchmakingError::InvalidPayload { .. }
            | MatchmakingError::UnknownUser { .. }
            | MatchmakingError::RoomTooLarge { .. } => 400,
            MatchmakingError::NoRoomFound => 404,
            MatchmakingError::ConfigurationError { .. }
            | MatchmakingError::InternalError { .. } => 500,
        }
    }

    /// Error used when a shared lock has been poisoned by a panicking writer
    pub(crate) fn lock_poisoned(what: &str) -> Self {
        MatchmakingError::InternalError {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}

/// Status code for an arbitrary error, falling back to 500 for untyped failures
pub fn status_code_for(error: &anyhow::Error) -> u16 {
    error
        .downcast_ref::<MatchmakingError>()
        .map(MatchmakingError::status_code)
        .unwrap_or(500)
}
